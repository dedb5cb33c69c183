//! Quiz Service - attempt lifecycle, attempt limits and grading

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::grading::{AnswerGrader, grade};
use super::{GamificationService, gamification_service::earned_entry};
use crate::domain::{
    CoinReference, DomainError, Principal, QuizAttemptRepository, QuizRepository, QuizStats,
    QuizWithQuestions, SubmissionPlan, SubmissionRecord,
};
use crate::models::{badge, quiz_attempt};

/// Graded submission together with the badges it unlocked
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuizSubmission {
    #[serde(flatten)]
    pub submission: SubmissionRecord,
    #[schema(value_type = Vec<Object>)]
    pub new_badges: Vec<badge::Model>,
}

pub struct QuizService {
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
    grader: Arc<dyn AnswerGrader>,
    gamification: Arc<GamificationService>,
}

impl QuizService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
        grader: Arc<dyn AnswerGrader>,
        gamification: Arc<GamificationService>,
    ) -> Self {
        Self {
            quizzes,
            attempts,
            grader,
            gamification,
        }
    }

    pub async fn get_quiz(&self, quiz_id: Uuid) -> Result<QuizWithQuestions, DomainError> {
        self.quizzes
            .find_with_questions(quiz_id)
            .await?
            .ok_or(DomainError::NotFound("quiz"))
    }

    pub async fn start_attempt(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<quiz_attempt::Model, DomainError> {
        let quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or(DomainError::NotFound("quiz"))?;

        if quiz.max_attempts > 0 {
            let prior = self.attempts.count_for(user_id, quiz_id).await?;
            if prior >= quiz.max_attempts as u64 {
                return Err(DomainError::AttemptLimitExceeded);
            }
        }

        let attempt = self
            .attempts
            .start(user_id, quiz_id, quiz.max_attempts, Utc::now())
            .await?;
        tracing::debug!(
            "User {} started attempt {} of quiz '{}'",
            user_id,
            attempt.attempt_number,
            quiz.title
        );
        Ok(attempt)
    }

    /// Grade and close an attempt.
    ///
    /// `answers` maps question ids to the raw answer, an option id for
    /// choice questions.
    pub async fn submit_attempt(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
        attempt_id: Uuid,
        answers: HashMap<Uuid, String>,
        time_spent_seconds: i32,
    ) -> Result<QuizSubmission, DomainError> {
        let attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await?
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
            .ok_or(DomainError::NotFound("quiz attempt"))?;

        if time_spent_seconds < 0 {
            return Err(DomainError::InvalidRange(
                "time spent must not be negative".to_string(),
            ));
        }
        if attempt.is_submitted() {
            return Err(DomainError::AlreadySubmitted);
        }

        let QuizWithQuestions { quiz, questions } = self.get_quiz(quiz_id).await?;
        let result = grade(&questions, &answers, self.grader.as_ref());
        let is_passed = result.percentage >= quiz.passing_score;

        let reward = if is_passed && quiz.coins_reward > 0 {
            Some(earned_entry(
                user_id,
                quiz.coins_reward,
                format!("Quiz Passed: {}", quiz.title),
                Some(CoinReference::quiz(quiz_id)),
            )?)
        } else {
            None
        };

        let now = Utc::now();
        let submission = self
            .attempts
            .submit(SubmissionPlan {
                attempt_id,
                score: result.score,
                max_score: result.max_score,
                percentage: result.percentage,
                is_passed,
                time_spent_seconds,
                submitted_at: now,
                answers: result.answers,
                reward,
            })
            .await?;

        tracing::info!(
            "User {} scored {}/{} ({}%) on quiz '{}'",
            user_id,
            result.score,
            result.max_score,
            result.percentage,
            quiz.title
        );

        self.gamification
            .record_activity(user_id, now.date_naive())
            .await?;
        let new_badges = self.gamification.check_and_award_badges(user_id).await?;

        Ok(QuizSubmission {
            submission,
            new_badges,
        })
    }

    pub async fn list_attempts(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<Vec<quiz_attempt::Model>, DomainError> {
        self.attempts.list_for(user_id, quiz_id).await
    }

    pub async fn attempt_count(&self, user_id: Uuid, quiz_id: Uuid) -> Result<u64, DomainError> {
        self.attempts.count_for(user_id, quiz_id).await
    }

    pub async fn quiz_stats(
        &self,
        principal: &Principal,
        quiz_id: Uuid,
    ) -> Result<QuizStats, DomainError> {
        principal.require_reports()?;
        if self.quizzes.find_by_id(quiz_id).await?.is_none() {
            return Err(DomainError::NotFound("quiz"));
        }
        self.attempts.stats(quiz_id).await
    }
}
