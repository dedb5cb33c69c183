//! SeaORM implementation of ProgressRepository

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::{DomainError, ProgressRepository, ProgressUpdate};
use crate::models::lesson;
use crate::models::lesson_progress::{self, Entity as ProgressEntity};
use crate::models::user::{self, Entity as UserEntity};

/// SeaORM-based implementation of ProgressRepository
pub struct SeaOrmProgressRepository {
    db: DatabaseConnection,
}

impl SeaOrmProgressRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn find_row<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    course_id: Uuid,
    lesson_id: Uuid,
) -> Result<Option<lesson_progress::Model>, DomainError> {
    let row = ProgressEntity::find()
        .filter(lesson_progress::Column::UserId.eq(user_id))
        .filter(lesson_progress::Column::CourseId.eq(course_id))
        .filter(lesson_progress::Column::LessonId.eq(lesson_id))
        .filter(lesson_progress::Column::DeletedAt.is_null())
        .one(conn)
        .await?;
    Ok(row)
}

#[async_trait]
impl ProgressRepository for SeaOrmProgressRepository {
    async fn find(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<lesson_progress::Model>, DomainError> {
        find_row(&self.db, user_id, course_id, lesson_id).await
    }

    async fn save(&self, update: ProgressUpdate) -> Result<lesson_progress::Model, DomainError> {
        let txn = self.db.begin().await?;
        let at = update.at;

        let row = match find_row(&txn, update.user_id, update.course_id, update.lesson_id).await? {
            Some(existing) => {
                let mut active: lesson_progress::ActiveModel = existing.into();
                active.watched_seconds = Set(update.watched_seconds);
                active.total_seconds = Set(update.total_seconds);
                active.progress_percentage = Set(update.progress_percentage);
                active.last_accessed_at = Set(at);
                active.updated_at = Set(at);
                active.update(&txn).await?
            }
            None => {
                let active = lesson_progress::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(update.user_id),
                    course_id: Set(update.course_id),
                    lesson_id: Set(update.lesson_id),
                    watched_seconds: Set(update.watched_seconds),
                    total_seconds: Set(update.total_seconds),
                    progress_percentage: Set(update.progress_percentage),
                    is_completed: Set(false),
                    completed_at: Set(None),
                    last_accessed_at: Set(at),
                    created_at: Set(at),
                    updated_at: Set(at),
                    deleted_at: Set(None),
                };
                active.insert(&txn).await?
            }
        };

        if update.reaches_completion {
            // First completion wins; later ones leave completed_at alone
            let completed = ProgressEntity::update_many()
                .col_expr(lesson_progress::Column::IsCompleted, Expr::value(true))
                .col_expr(lesson_progress::Column::CompletedAt, Expr::value(at))
                .filter(lesson_progress::Column::Id.eq(row.id))
                .filter(lesson_progress::Column::IsCompleted.eq(false))
                .exec(&txn)
                .await?;

            if completed.rows_affected > 0 {
                UserEntity::update_many()
                    .col_expr(
                        user::Column::TotalLearningSeconds,
                        Expr::col(user::Column::TotalLearningSeconds).add(update.credited_seconds),
                    )
                    .filter(user::Column::Id.eq(update.user_id))
                    .exec(&txn)
                    .await?;
                tracing::debug!(
                    "Lesson {} completed by user {}",
                    update.lesson_id,
                    update.user_id
                );
            }
        }

        let saved = ProgressEntity::find_by_id(row.id)
            .one(&txn)
            .await?
            .ok_or(DomainError::NotFound("lesson progress"))?;
        txn.commit().await?;
        Ok(saved)
    }

    async fn list_for_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Vec<lesson_progress::Model>, DomainError> {
        let rows = ProgressEntity::find()
            .find_also_related(lesson::Entity)
            .filter(lesson_progress::Column::UserId.eq(user_id))
            .filter(lesson_progress::Column::CourseId.eq(course_id))
            .filter(lesson_progress::Column::DeletedAt.is_null())
            .order_by_asc(lesson::Column::OrderNumber)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|(progress, _)| progress).collect())
    }
}
