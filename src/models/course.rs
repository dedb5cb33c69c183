use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub instructor_id: Option<Uuid>,
    pub is_mandatory: bool,
    pub mandatory_due_date: Option<DateTimeUtc>,
    pub passing_score: i32,
    pub coins_reward: i64,
    /// 0 means unlimited
    pub max_enrollments: i32,
    pub is_published: bool,
    pub enrollment_count: i32,
    pub completion_count: i32,
    pub average_rating: f64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    #[serde(skip)]
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::lesson::Entity")]
    Lesson,
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollment,
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lesson.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the enrollment cap has been reached
    pub fn is_full(&self) -> bool {
        self.max_enrollments > 0 && self.enrollment_count >= self.max_enrollments
    }
}
