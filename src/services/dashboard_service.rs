//! Dashboard Service - read-only summary of a learner's state

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    BadgeRepository, CertificateRepository, CoinLedgerRepository, DomainError,
    EnrollmentRepository, EnrollmentWithCourse, UserRepository,
};
use crate::models::{BadgeLevel, EnrollmentStatus, coin_transaction};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Dashboard {
    pub user_id: Uuid,
    /// Incomplete mandatory enrollments, earliest due first
    pub mandatory_courses: Vec<EnrollmentWithCourse>,
    pub in_progress_courses: Vec<EnrollmentWithCourse>,
    pub completed_courses: u64,
    pub certificates: u64,
    pub coins: i64,
    #[schema(value_type = String)]
    pub badge_level: BadgeLevel,
    pub badges_earned: u64,
    pub learning_hours: f64,
    pub current_streak: i32,
    /// 1 is the learner with the most learning time
    pub leaderboard_rank: u64,
    #[schema(value_type = Vec<Object>)]
    pub recent_transactions: Vec<coin_transaction::Model>,
}

pub struct DashboardService {
    users: Arc<dyn UserRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    certificates: Arc<dyn CertificateRepository>,
    ledger: Arc<dyn CoinLedgerRepository>,
    badges: Arc<dyn BadgeRepository>,
    recent_transactions: u64,
}

impl DashboardService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        certificates: Arc<dyn CertificateRepository>,
        ledger: Arc<dyn CoinLedgerRepository>,
        badges: Arc<dyn BadgeRepository>,
        recent_transactions: u64,
    ) -> Self {
        Self {
            users,
            enrollments,
            certificates,
            ledger,
            badges,
            recent_transactions,
        }
    }

    pub async fn get_dashboard(&self, user_id: Uuid) -> Result<Dashboard, DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;

        Ok(Dashboard {
            user_id,
            mandatory_courses: self.enrollments.list_mandatory(user_id, true).await?,
            in_progress_courses: self
                .enrollments
                .list_for_user(user_id, Some(EnrollmentStatus::InProgress))
                .await?,
            completed_courses: self
                .enrollments
                .count_by_status(user_id, EnrollmentStatus::Completed)
                .await?,
            certificates: self.certificates.count_for_user(user_id).await?,
            coins: user.coins,
            badge_level: user.current_badge_level,
            badges_earned: self.badges.count_earned(user_id).await?,
            learning_hours: user.total_learning_seconds as f64 / 3600.0,
            current_streak: user.current_streak,
            leaderboard_rank: self.users.learning_rank(user_id).await?,
            recent_transactions: self
                .ledger
                .recent(user_id, self.recent_transactions)
                .await?,
        })
    }
}
