use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quiz_attempts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub attempt_number: i32,
    pub score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub is_passed: bool,
    pub started_at: DateTimeUtc,
    /// Null while the attempt is in progress
    pub submitted_at: Option<DateTimeUtc>,
    pub time_spent_seconds: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    #[serde(skip)]
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quiz::Entity",
        from = "Column::QuizId",
        to = "super::quiz::Column::Id"
    )]
    Quiz,
    #[sea_orm(has_many = "super::quiz_answer::Entity")]
    QuizAnswer,
}

impl Related<super::quiz::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quiz.def()
    }
}

impl Related<super::quiz_answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuizAnswer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }
}
