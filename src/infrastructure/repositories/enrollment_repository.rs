//! SeaORM implementation of EnrollmentRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::coin_ledger_repository::append_entry;
use crate::domain::{
    CompletionPlan, CompletionRecord, DomainError, EnrollmentRepository, EnrollmentWithCourse,
    is_unique_violation,
};
use crate::models::EnrollmentStatus;
use crate::models::certificate;
use crate::models::course::{self, Entity as CourseEntity};
use crate::models::enrollment::{self, Entity as EnrollmentEntity};

/// SeaORM-based implementation of EnrollmentRepository
pub struct SeaOrmEnrollmentRepository {
    db: DatabaseConnection,
}

impl SeaOrmEnrollmentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn by_pair(user_id: Uuid, course_id: Uuid) -> Select<EnrollmentEntity> {
    EnrollmentEntity::find()
        .filter(enrollment::Column::UserId.eq(user_id))
        .filter(enrollment::Column::CourseId.eq(course_id))
        .filter(enrollment::Column::DeletedAt.is_null())
}

async fn find_pair<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Option<enrollment::Model>, DomainError> {
    Ok(by_pair(user_id, course_id).one(conn).await?)
}

async fn require_pair<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<enrollment::Model, DomainError> {
    find_pair(conn, user_id, course_id)
        .await?
        .ok_or(DomainError::NotFound("enrollment"))
}

fn with_course(rows: Vec<(enrollment::Model, Option<course::Model>)>) -> Vec<EnrollmentWithCourse> {
    rows.into_iter()
        .filter_map(|(enrollment, course)| {
            course
                .filter(|c| c.deleted_at.is_none())
                .map(|course| EnrollmentWithCourse { enrollment, course })
        })
        .collect()
}

#[async_trait]
impl EnrollmentRepository for SeaOrmEnrollmentRepository {
    async fn find(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<enrollment::Model>, DomainError> {
        find_pair(&self.db, user_id, course_id).await
    }

    async fn enroll(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<enrollment::Model, DomainError> {
        let txn = self.db.begin().await?;

        if find_pair(&txn, user_id, course_id).await?.is_some() {
            return Err(DomainError::AlreadyEnrolled);
        }

        // The counter only moves while the course has room
        let bumped = CourseEntity::update_many()
            .col_expr(
                course::Column::EnrollmentCount,
                Expr::col(course::Column::EnrollmentCount).add(1),
            )
            .col_expr(course::Column::UpdatedAt, Expr::value(at))
            .filter(course::Column::Id.eq(course_id))
            .filter(course::Column::DeletedAt.is_null())
            .filter(
                Condition::any()
                    .add(course::Column::MaxEnrollments.lte(0))
                    .add(
                        Expr::col(course::Column::EnrollmentCount)
                            .lt(Expr::col(course::Column::MaxEnrollments)),
                    ),
            )
            .exec(&txn)
            .await?;

        if bumped.rows_affected == 0 {
            let exists = CourseEntity::find_by_id(course_id)
                .filter(course::Column::DeletedAt.is_null())
                .one(&txn)
                .await?
                .is_some();
            return Err(if exists {
                DomainError::CourseFull
            } else {
                DomainError::NotFound("course")
            });
        }

        let row = enrollment::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            course_id: Set(course_id),
            completion_status: Set(EnrollmentStatus::NotStarted),
            overall_progress: Set(0),
            final_score: Set(None),
            is_passed: Set(false),
            enrolled_at: Set(at),
            last_accessed_at: Set(None),
            completed_at: Set(None),
            created_at: Set(at),
            updated_at: Set(at),
            deleted_at: Set(None),
        };

        let created = row.insert(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::AlreadyEnrolled
            } else {
                e.into()
            }
        })?;

        txn.commit().await?;
        Ok(created)
    }

    async fn mark_started(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<enrollment::Model, DomainError> {
        EnrollmentEntity::update_many()
            .col_expr(
                enrollment::Column::CompletionStatus,
                Expr::value(EnrollmentStatus::InProgress.to_value()),
            )
            .col_expr(enrollment::Column::LastAccessedAt, Expr::value(at))
            .col_expr(enrollment::Column::UpdatedAt, Expr::value(at))
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::CourseId.eq(course_id))
            .filter(enrollment::Column::DeletedAt.is_null())
            .filter(enrollment::Column::CompletionStatus.ne(EnrollmentStatus::Completed))
            .exec(&self.db)
            .await?;

        require_pair(&self.db, user_id, course_id).await
    }

    async fn set_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        progress: i32,
        at: DateTime<Utc>,
    ) -> Result<enrollment::Model, DomainError> {
        let txn = self.db.begin().await?;

        EnrollmentEntity::update_many()
            .col_expr(enrollment::Column::OverallProgress, Expr::value(progress))
            .col_expr(enrollment::Column::LastAccessedAt, Expr::value(at))
            .col_expr(enrollment::Column::UpdatedAt, Expr::value(at))
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::CourseId.eq(course_id))
            .filter(enrollment::Column::DeletedAt.is_null())
            .filter(enrollment::Column::CompletionStatus.ne(EnrollmentStatus::Completed))
            .exec(&txn)
            .await?;

        if progress > 0 {
            EnrollmentEntity::update_many()
                .col_expr(
                    enrollment::Column::CompletionStatus,
                    Expr::value(EnrollmentStatus::InProgress.to_value()),
                )
                .filter(enrollment::Column::UserId.eq(user_id))
                .filter(enrollment::Column::CourseId.eq(course_id))
                .filter(enrollment::Column::DeletedAt.is_null())
                .filter(enrollment::Column::CompletionStatus.eq(EnrollmentStatus::NotStarted))
                .exec(&txn)
                .await?;
        }

        let enrollment = require_pair(&txn, user_id, course_id).await?;
        txn.commit().await?;
        Ok(enrollment)
    }

    async fn complete(&self, plan: CompletionPlan) -> Result<CompletionRecord, DomainError> {
        let txn = self.db.begin().await?;
        let at = plan.completed_at;

        let updated = EnrollmentEntity::update_many()
            .col_expr(
                enrollment::Column::CompletionStatus,
                Expr::value(EnrollmentStatus::Completed.to_value()),
            )
            .col_expr(enrollment::Column::OverallProgress, Expr::value(100))
            .col_expr(enrollment::Column::FinalScore, Expr::value(plan.final_score))
            .col_expr(enrollment::Column::IsPassed, Expr::value(plan.is_passed))
            .col_expr(enrollment::Column::CompletedAt, Expr::value(at))
            .col_expr(enrollment::Column::LastAccessedAt, Expr::value(at))
            .col_expr(enrollment::Column::UpdatedAt, Expr::value(at))
            .filter(enrollment::Column::UserId.eq(plan.user_id))
            .filter(enrollment::Column::CourseId.eq(plan.course_id))
            .filter(enrollment::Column::DeletedAt.is_null())
            .filter(enrollment::Column::CompletionStatus.ne(EnrollmentStatus::Completed))
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            // Missing, or completed earlier: nothing to apply
            let enrollment = require_pair(&txn, plan.user_id, plan.course_id).await?;
            return Ok(CompletionRecord {
                enrollment,
                newly_completed: false,
                transaction: None,
                certificate: None,
            });
        }

        CourseEntity::update_many()
            .col_expr(
                course::Column::CompletionCount,
                Expr::col(course::Column::CompletionCount).add(1),
            )
            .col_expr(course::Column::UpdatedAt, Expr::value(at))
            .filter(course::Column::Id.eq(plan.course_id))
            .exec(&txn)
            .await?;

        let transaction = match &plan.reward {
            Some(entry) => Some(append_entry(&txn, entry, at).await?),
            None => None,
        };

        let certificate = match plan.certificate {
            Some(new) => {
                let row = certificate::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(plan.user_id),
                    course_id: Set(plan.course_id),
                    certificate_number: Set(new.certificate_number),
                    score: Set(new.score),
                    issued_at: Set(new.issued_at),
                    created_at: Set(at),
                    updated_at: Set(at),
                    deleted_at: Set(None),
                };
                Some(row.insert(&txn).await?)
            }
            None => None,
        };

        let enrollment = require_pair(&txn, plan.user_id, plan.course_id).await?;
        txn.commit().await?;

        Ok(CompletionRecord {
            enrollment,
            newly_completed: true,
            transaction,
            certificate,
        })
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<EnrollmentWithCourse>, DomainError> {
        let mut query = EnrollmentEntity::find()
            .find_also_related(CourseEntity)
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::DeletedAt.is_null());
        if let Some(status) = status {
            query = query.filter(enrollment::Column::CompletionStatus.eq(status));
        }

        let rows = query
            .order_by_desc(enrollment::Column::EnrolledAt)
            .all(&self.db)
            .await?;
        Ok(with_course(rows))
    }

    async fn list_mandatory(
        &self,
        user_id: Uuid,
        incomplete_only: bool,
    ) -> Result<Vec<EnrollmentWithCourse>, DomainError> {
        let mut query = EnrollmentEntity::find()
            .find_also_related(CourseEntity)
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::DeletedAt.is_null())
            .filter(course::Column::IsMandatory.eq(true));
        if incomplete_only {
            query = query
                .filter(enrollment::Column::CompletionStatus.ne(EnrollmentStatus::Completed));
        }

        let rows = query
            .order_by_asc(course::Column::MandatoryDueDate)
            .all(&self.db)
            .await?;
        Ok(with_course(rows))
    }

    async fn list_overdue(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<EnrollmentWithCourse>, DomainError> {
        let rows = EnrollmentEntity::find()
            .find_also_related(CourseEntity)
            .filter(enrollment::Column::DeletedAt.is_null())
            .filter(enrollment::Column::CompletionStatus.ne(EnrollmentStatus::Completed))
            .filter(course::Column::IsMandatory.eq(true))
            .filter(course::Column::MandatoryDueDate.is_not_null())
            .filter(course::Column::MandatoryDueDate.lt(now))
            .order_by_asc(course::Column::MandatoryDueDate)
            .all(&self.db)
            .await?;
        Ok(with_course(rows))
    }

    async fn count_by_status(
        &self,
        user_id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<u64, DomainError> {
        let count = EnrollmentEntity::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::DeletedAt.is_null())
            .filter(enrollment::Column::CompletionStatus.eq(status))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn average_final_score(&self, user_id: Uuid) -> Result<Option<f64>, DomainError> {
        let avg = EnrollmentEntity::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(enrollment::Column::FinalScore))),
                "avg_score",
            )
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::DeletedAt.is_null())
            .filter(enrollment::Column::CompletionStatus.eq(EnrollmentStatus::Completed))
            .into_tuple::<Option<f64>>()
            .one(&self.db)
            .await?;
        Ok(avg.flatten())
    }
}
