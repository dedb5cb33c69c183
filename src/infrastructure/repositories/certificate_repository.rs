//! SeaORM implementation of CertificateRepository

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select,
};
use uuid::Uuid;

use crate::domain::{CertificateRepository, DomainError};
use crate::models::certificate::{Column, Entity as CertificateEntity, Model};

/// SeaORM-based implementation of CertificateRepository
pub struct SeaOrmCertificateRepository {
    db: DatabaseConnection,
}

impl SeaOrmCertificateRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn of_user(user_id: Uuid) -> Select<CertificateEntity> {
    CertificateEntity::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::DeletedAt.is_null())
}

#[async_trait]
impl CertificateRepository for SeaOrmCertificateRepository {
    async fn find_for(&self, user_id: Uuid, course_id: Uuid) -> Result<Option<Model>, DomainError> {
        let certificate = of_user(user_id)
            .filter(Column::CourseId.eq(course_id))
            .one(&self.db)
            .await?;
        Ok(certificate)
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Model>, DomainError> {
        let certificate = CertificateEntity::find()
            .filter(Column::CertificateNumber.eq(number))
            .filter(Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        Ok(certificate)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Model>, DomainError> {
        let certificates = of_user(user_id)
            .order_by_desc(Column::IssuedAt)
            .all(&self.db)
            .await?;
        Ok(certificates)
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<u64, DomainError> {
        Ok(of_user(user_id).count(&self.db).await?)
    }
}
