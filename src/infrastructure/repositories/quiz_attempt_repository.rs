//! SeaORM implementation of QuizAttemptRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use uuid::Uuid;

use super::coin_ledger_repository::append_entry;
use crate::domain::{
    DomainError, QuizAttemptRepository, QuizStats, SubmissionPlan, SubmissionRecord,
    is_unique_violation,
};
use crate::models::quiz_answer::{self, Entity as QuizAnswerEntity};
use crate::models::quiz_attempt::{self, Entity as QuizAttemptEntity};

/// Extra tries when a concurrent start takes the same attempt number
const START_RETRIES: usize = 3;

/// SeaORM-based implementation of QuizAttemptRepository
pub struct SeaOrmQuizAttemptRepository {
    db: DatabaseConnection,
}

impl SeaOrmQuizAttemptRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// Tombstoned attempts still consume their number and count towards the limit
fn attempts_of(user_id: Uuid, quiz_id: Uuid) -> Select<QuizAttemptEntity> {
    QuizAttemptEntity::find()
        .filter(quiz_attempt::Column::UserId.eq(user_id))
        .filter(quiz_attempt::Column::QuizId.eq(quiz_id))
}

fn submitted_of_quiz(quiz_id: Uuid) -> Select<QuizAttemptEntity> {
    QuizAttemptEntity::find()
        .filter(quiz_attempt::Column::QuizId.eq(quiz_id))
        .filter(quiz_attempt::Column::SubmittedAt.is_not_null())
        .filter(quiz_attempt::Column::DeletedAt.is_null())
}

async fn answers_of<C: ConnectionTrait>(
    conn: &C,
    attempt_id: Uuid,
) -> Result<Vec<quiz_answer::Model>, DomainError> {
    let answers = QuizAnswerEntity::find()
        .filter(quiz_answer::Column::AttemptId.eq(attempt_id))
        .filter(quiz_answer::Column::DeletedAt.is_null())
        .order_by_asc(quiz_answer::Column::CreatedAt)
        .all(conn)
        .await?;
    Ok(answers)
}

#[async_trait]
impl QuizAttemptRepository for SeaOrmQuizAttemptRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<quiz_attempt::Model>, DomainError> {
        let attempt = QuizAttemptEntity::find_by_id(id)
            .filter(quiz_attempt::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(attempt)
    }

    async fn count_for(&self, user_id: Uuid, quiz_id: Uuid) -> Result<u64, DomainError> {
        Ok(attempts_of(user_id, quiz_id).count(&self.db).await?)
    }

    async fn start(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
        max_attempts: i32,
        at: DateTime<Utc>,
    ) -> Result<quiz_attempt::Model, DomainError> {
        for _ in 0..=START_RETRIES {
            let txn = self.db.begin().await?;

            let prior = attempts_of(user_id, quiz_id).count(&txn).await?;
            if max_attempts > 0 && prior >= max_attempts as u64 {
                return Err(DomainError::AttemptLimitExceeded);
            }

            let attempt = quiz_attempt::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                quiz_id: Set(quiz_id),
                attempt_number: Set(prior as i32 + 1),
                score: Set(0),
                max_score: Set(0),
                percentage: Set(0),
                is_passed: Set(false),
                started_at: Set(at),
                submitted_at: Set(None),
                time_spent_seconds: Set(0),
                created_at: Set(at),
                updated_at: Set(at),
                deleted_at: Set(None),
            };

            match attempt.insert(&txn).await {
                Ok(created) => {
                    txn.commit().await?;
                    return Ok(created);
                }
                Err(e) if is_unique_violation(&e) => {
                    tracing::debug!(
                        "Attempt number {} for quiz {} taken concurrently, recounting",
                        prior + 1,
                        quiz_id
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::Storage(
            "could not allocate a quiz attempt number".to_string(),
        ))
    }

    async fn submit(&self, plan: SubmissionPlan) -> Result<SubmissionRecord, DomainError> {
        let txn = self.db.begin().await?;
        let at = plan.submitted_at;

        let updated = QuizAttemptEntity::update_many()
            .col_expr(quiz_attempt::Column::Score, Expr::value(plan.score))
            .col_expr(quiz_attempt::Column::MaxScore, Expr::value(plan.max_score))
            .col_expr(quiz_attempt::Column::Percentage, Expr::value(plan.percentage))
            .col_expr(quiz_attempt::Column::IsPassed, Expr::value(plan.is_passed))
            .col_expr(
                quiz_attempt::Column::TimeSpentSeconds,
                Expr::value(plan.time_spent_seconds),
            )
            .col_expr(quiz_attempt::Column::SubmittedAt, Expr::value(at))
            .col_expr(quiz_attempt::Column::UpdatedAt, Expr::value(at))
            .filter(quiz_attempt::Column::Id.eq(plan.attempt_id))
            .filter(quiz_attempt::Column::DeletedAt.is_null())
            .filter(quiz_attempt::Column::SubmittedAt.is_null())
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            let exists = QuizAttemptEntity::find_by_id(plan.attempt_id)
                .filter(quiz_attempt::Column::DeletedAt.is_null())
                .one(&txn)
                .await?
                .is_some();
            return Err(if exists {
                DomainError::AlreadySubmitted
            } else {
                DomainError::NotFound("quiz attempt")
            });
        }

        for answer in &plan.answers {
            quiz_answer::ActiveModel {
                id: Set(Uuid::new_v4()),
                attempt_id: Set(plan.attempt_id),
                question_id: Set(answer.question_id),
                user_answer: Set(answer.user_answer.clone()),
                is_correct: Set(answer.is_correct),
                points_earned: Set(i32::from(answer.is_correct)),
                created_at: Set(at),
                updated_at: Set(at),
                deleted_at: Set(None),
            }
            .insert(&txn)
            .await?;
        }

        let transaction = match &plan.reward {
            Some(entry) => Some(append_entry(&txn, entry, at).await?),
            None => None,
        };

        let attempt = QuizAttemptEntity::find_by_id(plan.attempt_id)
            .one(&txn)
            .await?
            .ok_or(DomainError::NotFound("quiz attempt"))?;
        let answers = answers_of(&txn, plan.attempt_id).await?;
        txn.commit().await?;

        Ok(SubmissionRecord {
            attempt,
            answers,
            transaction,
        })
    }

    async fn list_for(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<Vec<quiz_attempt::Model>, DomainError> {
        let attempts = attempts_of(user_id, quiz_id)
            .filter(quiz_attempt::Column::DeletedAt.is_null())
            .order_by_asc(quiz_attempt::Column::AttemptNumber)
            .all(&self.db)
            .await?;
        Ok(attempts)
    }

    async fn answers_for(&self, attempt_id: Uuid) -> Result<Vec<quiz_answer::Model>, DomainError> {
        answers_of(&self.db, attempt_id).await
    }

    async fn count_perfect(&self, user_id: Uuid) -> Result<u64, DomainError> {
        let count = QuizAttemptEntity::find()
            .filter(quiz_attempt::Column::UserId.eq(user_id))
            .filter(quiz_attempt::Column::SubmittedAt.is_not_null())
            .filter(quiz_attempt::Column::DeletedAt.is_null())
            .filter(quiz_attempt::Column::MaxScore.gt(0))
            .filter(quiz_attempt::Column::Percentage.gte(100))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn stats(&self, quiz_id: Uuid) -> Result<QuizStats, DomainError> {
        let total = submitted_of_quiz(quiz_id).count(&self.db).await?;
        if total == 0 {
            return Ok(QuizStats::default());
        }

        let passed = submitted_of_quiz(quiz_id)
            .filter(quiz_attempt::Column::IsPassed.eq(true))
            .count(&self.db)
            .await?;

        let average = submitted_of_quiz(quiz_id)
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(quiz_attempt::Column::Percentage))),
                "avg_percentage",
            )
            .into_tuple::<Option<f64>>()
            .one(&self.db)
            .await?
            .flatten()
            .unwrap_or(0.0);

        Ok(QuizStats {
            total_attempts: total,
            passed_attempts: passed,
            pass_rate: passed as f64 * 100.0 / total as f64,
            average_percentage: average,
        })
    }
}
