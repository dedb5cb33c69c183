use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::{BadgeLevel, Role};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub department: Option<String>,
    pub role: Role,
    /// Cached sum of the user's coin ledger
    pub coins: i64,
    pub current_badge_level: BadgeLevel,
    pub current_streak: i32,
    pub last_activity_on: Option<Date>,
    /// Seconds of lessons completed so far
    pub total_learning_seconds: i64,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    #[serde(skip)]
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
