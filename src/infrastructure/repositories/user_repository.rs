//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::domain::{DomainError, NewUser, UserRepository};
use crate::models::BadgeLevel;
use crate::models::user::{ActiveModel, Column, Entity as UserEntity, Model};

/// SeaORM-based implementation of UserRepository
pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Model>, DomainError> {
        let user = UserEntity::find_by_id(id)
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Model>, DomainError> {
        let user = UserEntity::find()
            .filter(Column::Email.eq(email))
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(user)
    }

    async fn create(&self, input: NewUser) -> Result<Model, DomainError> {
        let now = Utc::now();

        let user = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            department: Set(input.department),
            role: Set(input.role),
            coins: Set(0),
            current_badge_level: Set(BadgeLevel::Bronze),
            current_streak: Set(0),
            last_activity_on: Set(None),
            total_learning_seconds: Set(0),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        Ok(user.insert(&self.db).await?)
    }

    async fn learning_rank(&self, id: Uuid) -> Result<u64, DomainError> {
        let user = self
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;

        let ahead = UserEntity::find()
            .filter(Column::DeletedAt.is_null())
            .filter(Column::TotalLearningSeconds.gt(user.total_learning_seconds))
            .count(&self.db)
            .await?;

        Ok(ahead + 1)
    }

    async fn set_streak(
        &self,
        id: Uuid,
        streak: i32,
        day: NaiveDate,
        previous: Option<NaiveDate>,
    ) -> Result<Option<Model>, DomainError> {
        // Only the request that still sees `previous` gets to move the streak
        let observed = match previous {
            Some(last) => Column::LastActivityOn.eq(last),
            None => Column::LastActivityOn.is_null(),
        };
        let result = UserEntity::update_many()
            .col_expr(Column::CurrentStreak, Expr::value(streak))
            .col_expr(Column::LastActivityOn, Expr::value(day))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::DeletedAt.is_null())
            .filter(observed)
            .filter(
                Condition::any()
                    .add(Column::LastActivityOn.is_null())
                    .add(Column::LastActivityOn.lt(day)),
            )
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn raise_badge_level(&self, id: Uuid, level: BadgeLevel) -> Result<bool, DomainError> {
        let lower = level.lower_levels();
        if lower.is_empty() {
            return Ok(false);
        }

        let result = UserEntity::update_many()
            .col_expr(Column::CurrentBadgeLevel, Expr::value(level.to_value()))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .filter(Column::DeletedAt.is_null())
            .filter(Column::CurrentBadgeLevel.is_in(lower))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
