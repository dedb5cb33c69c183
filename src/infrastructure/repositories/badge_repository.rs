//! SeaORM implementation of BadgeRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::{
    BadgeCriteria, BadgeDefinition, BadgeRepository, DomainError, NewBadge, UserBadge,
    is_unique_violation,
};
use crate::models::badge::{self, Entity as BadgeEntity};
use crate::models::badge_progress::{self, Entity as BadgeProgressEntity};

/// SeaORM-based implementation of BadgeRepository
pub struct SeaOrmBadgeRepository {
    db: DatabaseConnection,
}

impl SeaOrmBadgeRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_progress(
        &self,
        user_id: Uuid,
        badge_id: Uuid,
    ) -> Result<Option<badge_progress::Model>, DomainError> {
        let row = BadgeProgressEntity::find()
            .filter(badge_progress::Column::UserId.eq(user_id))
            .filter(badge_progress::Column::BadgeId.eq(badge_id))
            .filter(badge_progress::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(row)
    }

    async fn update_unearned(
        &self,
        user_id: Uuid,
        badge_id: Uuid,
        progress: i32,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        BadgeProgressEntity::update_many()
            .col_expr(badge_progress::Column::Progress, Expr::value(progress))
            .col_expr(badge_progress::Column::UpdatedAt, Expr::value(at))
            .filter(badge_progress::Column::UserId.eq(user_id))
            .filter(badge_progress::Column::BadgeId.eq(badge_id))
            .filter(badge_progress::Column::DeletedAt.is_null())
            .filter(badge_progress::Column::IsEarned.eq(false))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    fn new_progress_row(
        user_id: Uuid,
        badge_id: Uuid,
        progress: i32,
        earned_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> badge_progress::ActiveModel {
        badge_progress::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            badge_id: Set(badge_id),
            progress: Set(progress),
            is_earned: Set(earned_at.is_some()),
            earned_at: Set(earned_at),
            created_at: Set(at),
            updated_at: Set(at),
            deleted_at: Set(None),
        }
    }
}

#[async_trait]
impl BadgeRepository for SeaOrmBadgeRepository {
    async fn definitions(&self) -> Result<Vec<BadgeDefinition>, DomainError> {
        let badges = BadgeEntity::find()
            .filter(badge::Column::DeletedAt.is_null())
            .order_by_asc(badge::Column::Name)
            .all(&self.db)
            .await?;

        Ok(badges
            .into_iter()
            .filter_map(|badge| match BadgeCriteria::parse(&badge.criteria) {
                Ok(criteria) => Some(BadgeDefinition { badge, criteria }),
                Err(e) => {
                    tracing::warn!("Skipping badge '{}' with invalid criteria: {}", badge.name, e);
                    None
                }
            })
            .collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<badge::Model>, DomainError> {
        let badge = BadgeEntity::find()
            .filter(badge::Column::Name.eq(name))
            .filter(badge::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(badge)
    }

    async fn create(&self, input: NewBadge) -> Result<badge::Model, DomainError> {
        let now = Utc::now();

        let badge = badge::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            level: Set(input.level),
            icon_url: Set(None),
            criteria: Set(input.criteria.to_json()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        Ok(badge.insert(&self.db).await?)
    }

    async fn progress_for(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<badge_progress::Model>, DomainError> {
        let rows = BadgeProgressEntity::find()
            .filter(badge_progress::Column::UserId.eq(user_id))
            .filter(badge_progress::Column::DeletedAt.is_null())
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn set_progress(
        &self,
        user_id: Uuid,
        badge_id: Uuid,
        progress: i32,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        match self.find_progress(user_id, badge_id).await? {
            Some(row) if row.is_earned || row.progress == progress => Ok(()),
            Some(_) => self.update_unearned(user_id, badge_id, progress, at).await,
            None => {
                let row = Self::new_progress_row(user_id, badge_id, progress, None, at);
                match row.insert(&self.db).await {
                    Ok(_) => Ok(()),
                    // Created concurrently; update that row instead
                    Err(e) if is_unique_violation(&e) => {
                        self.update_unearned(user_id, badge_id, progress, at).await
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    async fn mark_earned(
        &self,
        user_id: Uuid,
        badge_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let updated = BadgeProgressEntity::update_many()
            .col_expr(badge_progress::Column::IsEarned, Expr::value(true))
            .col_expr(badge_progress::Column::EarnedAt, Expr::value(at))
            .col_expr(badge_progress::Column::Progress, Expr::value(100))
            .col_expr(badge_progress::Column::UpdatedAt, Expr::value(at))
            .filter(badge_progress::Column::UserId.eq(user_id))
            .filter(badge_progress::Column::BadgeId.eq(badge_id))
            .filter(badge_progress::Column::DeletedAt.is_null())
            .filter(badge_progress::Column::IsEarned.eq(false))
            .exec(&self.db)
            .await?;
        if updated.rows_affected > 0 {
            return Ok(true);
        }

        if self.find_progress(user_id, badge_id).await?.is_some() {
            return Ok(false);
        }

        let row = Self::new_progress_row(user_id, badge_id, 100, Some(at), at);
        match row.insert(&self.db).await {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn count_earned(&self, user_id: Uuid) -> Result<u64, DomainError> {
        let count = BadgeProgressEntity::find()
            .filter(badge_progress::Column::UserId.eq(user_id))
            .filter(badge_progress::Column::DeletedAt.is_null())
            .filter(badge_progress::Column::IsEarned.eq(true))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UserBadge>, DomainError> {
        let rows = BadgeProgressEntity::find()
            .find_also_related(BadgeEntity)
            .filter(badge_progress::Column::UserId.eq(user_id))
            .filter(badge_progress::Column::DeletedAt.is_null())
            .filter(badge::Column::DeletedAt.is_null())
            .order_by_desc(badge_progress::Column::IsEarned)
            .order_by_desc(badge_progress::Column::Progress)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(progress, badge)| badge.map(|badge| UserBadge { badge, progress }))
            .collect())
    }
}
