//! Gamification Service - coin ledger, learning streaks and badges

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    BadgeRepository, CoinEntry, CoinLedgerRepository, CoinReference, DomainError,
    EnrollmentRepository, Principal, QuizAttemptRepository, TransactionPage, UserBadge,
    UserRepository, UserStats,
};
use crate::models::{EnrollmentStatus, TransactionType, badge, coin_transaction, user};

/// Cached balance compared with the ledger it caches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LedgerCheck {
    pub balance: i64,
    pub ledger_sum: i64,
    pub consistent: bool,
}

/// Streak after activity on `day`, given the previous active day.
///
/// Consecutive days extend the streak, a repeat on the same day keeps it and
/// any gap restarts it at 1.
pub fn next_streak(current: i32, last_active: Option<NaiveDate>, day: NaiveDate) -> i32 {
    match last_active {
        Some(last) if last == day => current.max(1),
        Some(last) if last.succ_opt() == Some(day) => current + 1,
        _ => 1,
    }
}

/// Result of recording learning activity
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivityRecord {
    #[schema(value_type = Object)]
    pub user: user::Model,
    /// False when the day had already been counted
    pub streak_updated: bool,
}

/// Build a validated `earned` ledger entry
pub fn earned_entry(
    user_id: Uuid,
    amount: i64,
    reason: impl Into<String>,
    reference: Option<CoinReference>,
) -> Result<CoinEntry, DomainError> {
    if amount <= 0 {
        return Err(DomainError::InvalidAmount);
    }
    Ok(CoinEntry {
        user_id,
        amount,
        transaction_type: TransactionType::Earned,
        reason: reason.into(),
        reference,
    })
}

pub struct GamificationService {
    users: Arc<dyn UserRepository>,
    ledger: Arc<dyn CoinLedgerRepository>,
    badges: Arc<dyn BadgeRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
}

impl GamificationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        ledger: Arc<dyn CoinLedgerRepository>,
        badges: Arc<dyn BadgeRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
    ) -> Self {
        Self {
            users,
            ledger,
            badges,
            enrollments,
            attempts,
        }
    }

    pub async fn award_coins(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: &str,
        reference: Option<CoinReference>,
    ) -> Result<coin_transaction::Model, DomainError> {
        let entry = earned_entry(user_id, amount, reason, reference)?;
        let row = self.ledger.append(entry).await?;
        tracing::info!("Awarded {} coins to user {}: {}", amount, user_id, reason);
        Ok(row)
    }

    pub async fn spend_coins(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: &str,
    ) -> Result<coin_transaction::Model, DomainError> {
        self.debit(user_id, amount, TransactionType::Spent, reason)
            .await
    }

    pub async fn redeem_coins(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: &str,
    ) -> Result<coin_transaction::Model, DomainError> {
        self.debit(user_id, amount, TransactionType::Redeemed, reason)
            .await
    }

    async fn debit(
        &self,
        user_id: Uuid,
        amount: i64,
        transaction_type: TransactionType,
        reason: &str,
    ) -> Result<coin_transaction::Model, DomainError> {
        if amount <= 0 {
            return Err(DomainError::InvalidAmount);
        }
        let row = self
            .ledger
            .append(CoinEntry {
                user_id,
                amount: -amount,
                transaction_type,
                reason: reason.to_string(),
                reference: None,
            })
            .await?;
        tracing::info!("User {} used {} coins: {}", user_id, amount, reason);
        Ok(row)
    }

    /// Signed manual correction by an administrator
    pub async fn adjust_coins(
        &self,
        admin: &Principal,
        user_id: Uuid,
        amount: i64,
        reason: &str,
    ) -> Result<coin_transaction::Model, DomainError> {
        admin.require_admin()?;
        if amount == 0 {
            return Err(DomainError::InvalidAmount);
        }
        let row = self
            .ledger
            .append(CoinEntry {
                user_id,
                amount,
                transaction_type: TransactionType::AdminAdjustment,
                reason: reason.to_string(),
                reference: None,
            })
            .await?;
        tracing::info!(
            "Admin {} adjusted coins of user {} by {}: {}",
            admin.user_id,
            user_id,
            amount,
            reason
        );
        Ok(row)
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<i64, DomainError> {
        self.ledger.balance(user_id).await
    }

    pub async fn ledger_balance(&self, user_id: Uuid) -> Result<i64, DomainError> {
        self.ledger.ledger_sum(user_id).await
    }

    pub async fn verify_ledger(&self, user_id: Uuid) -> Result<LedgerCheck, DomainError> {
        let balance = self.ledger.balance(user_id).await?;
        let ledger_sum = self.ledger.ledger_sum(user_id).await?;
        if balance != ledger_sum {
            tracing::warn!(
                "Coin balance of user {} ({}) differs from its ledger ({})",
                user_id,
                balance,
                ledger_sum
            );
        }
        Ok(LedgerCheck {
            balance,
            ledger_sum,
            consistent: balance == ledger_sum,
        })
    }

    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<TransactionPage, DomainError> {
        let per_page = super::checked_page(page, per_page)?;
        self.ledger.page(user_id, page, per_page).await
    }

    /// Count `day` towards the user's learning streak
    pub async fn record_activity(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> Result<ActivityRecord, DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;

        // Same day or a late report of an older day
        if user.last_activity_on.is_some_and(|last| last >= day) {
            return Ok(ActivityRecord {
                user,
                streak_updated: false,
            });
        }

        let streak = next_streak(user.current_streak, user.last_activity_on, day);
        let Some(updated) = self
            .users
            .set_streak(user_id, streak, day, user.last_activity_on)
            .await?
        else {
            // A concurrent request already counted this day
            let user = self
                .users
                .find_by_id(user_id)
                .await?
                .ok_or(DomainError::NotFound("user"))?;
            return Ok(ActivityRecord {
                user,
                streak_updated: false,
            });
        };
        tracing::debug!("User {} learning streak is now {} days", user_id, streak);
        Ok(ActivityRecord {
            user: updated,
            streak_updated: true,
        })
    }

    pub async fn user_stats(&self, user: &user::Model) -> Result<UserStats, DomainError> {
        Ok(UserStats {
            coins_earned: self.ledger.total_earned(user.id).await?,
            learning_hours: user.total_learning_seconds as f64 / 3600.0,
            courses_completed: self
                .enrollments
                .count_by_status(user.id, EnrollmentStatus::Completed)
                .await?,
            average_final_score: self.enrollments.average_final_score(user.id).await?,
            perfect_quizzes: self.attempts.count_perfect(user.id).await?,
            streak_days: user.current_streak,
        })
    }

    /// Evaluate every badge for the user and award the ones now satisfied.
    ///
    /// Returns only the badges earned by this call. The user's badge level
    /// follows the highest earned badge and never goes down.
    pub async fn check_and_award_badges(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<badge::Model>, DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;

        let definitions = self.badges.definitions().await?;
        let progress: HashMap<Uuid, bool> = self
            .badges
            .progress_for(user_id)
            .await?
            .into_iter()
            .map(|p| (p.badge_id, p.is_earned))
            .collect();
        let stats = self.user_stats(&user).await?;
        let now = Utc::now();

        let mut highest = None;
        let mut newly_earned = Vec::new();
        for definition in definitions {
            let badge = definition.badge;
            if progress.get(&badge.id).copied().unwrap_or(false) {
                highest = highest.max(Some(badge.level));
                continue;
            }

            if definition.criteria.is_met(&stats) {
                if self.badges.mark_earned(user_id, badge.id, now).await? {
                    tracing::info!("User {} earned badge '{}'", user_id, badge.name);
                    highest = highest.max(Some(badge.level));
                    newly_earned.push(badge);
                }
            } else {
                let pct = definition.criteria.progress(&stats);
                self.badges.set_progress(user_id, badge.id, pct, now).await?;
            }
        }

        if let Some(level) = highest
            && level > user.current_badge_level
            && self.users.raise_badge_level(user_id, level).await?
        {
            tracing::info!("User {} reached badge level {:?}", user_id, level);
        }

        Ok(newly_earned)
    }

    pub async fn list_user_badges(&self, user_id: Uuid) -> Result<Vec<UserBadge>, DomainError> {
        self.badges.list_for_user(user_id).await
    }
}
