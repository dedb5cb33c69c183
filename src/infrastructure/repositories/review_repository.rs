//! SeaORM implementation of ReviewRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::{DomainError, NewReview, ReviewRepository, is_unique_violation};
use crate::models::course::{self, Entity as CourseEntity};
use crate::models::course_review::{self, Entity as ReviewEntity};

/// SeaORM-based implementation of ReviewRepository
pub struct SeaOrmReviewRepository {
    db: DatabaseConnection,
}

impl SeaOrmReviewRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewRepository for SeaOrmReviewRepository {
    async fn find_for(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<course_review::Model>, DomainError> {
        let review = ReviewEntity::find()
            .filter(course_review::Column::UserId.eq(user_id))
            .filter(course_review::Column::CourseId.eq(course_id))
            .filter(course_review::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(review)
    }

    async fn add(&self, input: NewReview) -> Result<course_review::Model, DomainError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        CourseEntity::find_by_id(input.course_id)
            .filter(course::Column::DeletedAt.is_null())
            .one(&txn)
            .await?
            .ok_or(DomainError::NotFound("course"))?;

        let review = course_review::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            course_id: Set(input.course_id),
            rating: Set(input.rating),
            review_text: Set(input.review_text),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::DuplicateReview
            } else {
                e.into()
            }
        })?;

        let average = ReviewEntity::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(course_review::Column::Rating))),
                "average_rating",
            )
            .filter(course_review::Column::CourseId.eq(input.course_id))
            .filter(course_review::Column::DeletedAt.is_null())
            .into_tuple::<Option<f64>>()
            .one(&txn)
            .await?
            .flatten()
            .unwrap_or(0.0);

        CourseEntity::update_many()
            .col_expr(course::Column::AverageRating, Expr::value(average))
            .col_expr(course::Column::UpdatedAt, Expr::value(now))
            .filter(course::Column::Id.eq(input.course_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(review)
    }

    async fn list_for_course(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<course_review::Model>, DomainError> {
        let reviews = ReviewEntity::find()
            .filter(course_review::Column::CourseId.eq(course_id))
            .filter(course_review::Column::DeletedAt.is_null())
            .order_by_desc(course_review::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(reviews)
    }
}
