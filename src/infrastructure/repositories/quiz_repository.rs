//! SeaORM implementation of QuizRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::domain::{
    DomainError, NewQuestion, NewQuiz, QuestionWithOptions, QuizRepository, QuizWithQuestions,
};
use crate::models::question::{self, Entity as QuestionEntity};
use crate::models::question_answer::{self, Entity as QuestionAnswerEntity};
use crate::models::question_option::{self, Entity as QuestionOptionEntity};
use crate::models::quiz::{self, Entity as QuizEntity};

/// SeaORM-based implementation of QuizRepository
pub struct SeaOrmQuizRepository {
    db: DatabaseConnection,
}

impl SeaOrmQuizRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QuizRepository for SeaOrmQuizRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<quiz::Model>, DomainError> {
        let quiz = QuizEntity::find_by_id(id)
            .filter(quiz::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(quiz)
    }

    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<quiz::Model>, DomainError> {
        let quizzes = QuizEntity::find()
            .filter(quiz::Column::CourseId.eq(course_id))
            .filter(quiz::Column::DeletedAt.is_null())
            .order_by_asc(quiz::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(quizzes)
    }

    async fn find_by_lesson(&self, lesson_id: Uuid) -> Result<Option<quiz::Model>, DomainError> {
        let quiz = QuizEntity::find()
            .filter(quiz::Column::LessonId.eq(lesson_id))
            .filter(quiz::Column::DeletedAt.is_null())
            .order_by_asc(quiz::Column::CreatedAt)
            .one(&self.db)
            .await?;
        Ok(quiz)
    }

    async fn find_with_questions(
        &self,
        id: Uuid,
    ) -> Result<Option<QuizWithQuestions>, DomainError> {
        let Some(quiz) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let questions = QuestionEntity::find()
            .filter(question::Column::QuizId.eq(id))
            .filter(question::Column::DeletedAt.is_null())
            .order_by_asc(question::Column::OrderNumber)
            .all(&self.db)
            .await?;
        let ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();

        let mut options: HashMap<Uuid, Vec<question_option::Model>> = HashMap::new();
        let mut answers: HashMap<Uuid, Vec<question_answer::Model>> = HashMap::new();
        if !ids.is_empty() {
            for option in QuestionOptionEntity::find()
                .filter(question_option::Column::QuestionId.is_in(ids.clone()))
                .filter(question_option::Column::DeletedAt.is_null())
                .order_by_asc(question_option::Column::OrderNumber)
                .all(&self.db)
                .await?
            {
                options.entry(option.question_id).or_default().push(option);
            }

            for answer in QuestionAnswerEntity::find()
                .filter(question_answer::Column::QuestionId.is_in(ids))
                .filter(question_answer::Column::DeletedAt.is_null())
                .all(&self.db)
                .await?
            {
                answers.entry(answer.question_id).or_default().push(answer);
            }
        }

        let questions = questions
            .into_iter()
            .map(|question| QuestionWithOptions {
                options: options.remove(&question.id).unwrap_or_default(),
                accepted_answers: answers.remove(&question.id).unwrap_or_default(),
                question,
            })
            .collect();

        Ok(Some(QuizWithQuestions { quiz, questions }))
    }

    async fn create(&self, input: NewQuiz) -> Result<quiz::Model, DomainError> {
        if !(0..=100).contains(&input.passing_score) {
            return Err(DomainError::InvalidRange(
                "passing score must be between 0 and 100".to_string(),
            ));
        }
        let now = Utc::now();

        let quiz = quiz::ActiveModel {
            id: Set(Uuid::new_v4()),
            course_id: Set(input.course_id),
            lesson_id: Set(input.lesson_id),
            title: Set(input.title),
            passing_score: Set(input.passing_score),
            max_attempts: Set(input.max_attempts.max(0)),
            time_limit_minutes: Set(input.time_limit_minutes),
            coins_reward: Set(input.coins_reward.max(0)),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        Ok(quiz.insert(&self.db).await?)
    }

    async fn add_question(&self, input: NewQuestion) -> Result<QuestionWithOptions, DomainError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let question = question::ActiveModel {
            id: Set(Uuid::new_v4()),
            quiz_id: Set(input.quiz_id),
            question_text: Set(input.text),
            question_type: Set(input.question_type),
            order_number: Set(input.order_number),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let mut options = Vec::with_capacity(input.options.len());
        for (index, option) in input.options.into_iter().enumerate() {
            let row = question_option::ActiveModel {
                id: Set(Uuid::new_v4()),
                question_id: Set(question.id),
                option_text: Set(option.text),
                is_correct: Set(option.is_correct),
                order_number: Set(index as i32 + 1),
                created_at: Set(now),
                updated_at: Set(now),
                deleted_at: Set(None),
            }
            .insert(&txn)
            .await?;
            options.push(row);
        }

        let mut accepted_answers = Vec::with_capacity(input.accepted_answers.len());
        for answer in input.accepted_answers {
            let row = question_answer::ActiveModel {
                id: Set(Uuid::new_v4()),
                question_id: Set(question.id),
                correct_text: Set(answer.text),
                is_partial_ok: Set(answer.is_partial_ok),
                created_at: Set(now),
                updated_at: Set(now),
                deleted_at: Set(None),
            }
            .insert(&txn)
            .await?;
            accepted_answers.push(row);
        }

        txn.commit().await?;

        Ok(QuestionWithOptions {
            question,
            options,
            accepted_answers,
        })
    }
}
