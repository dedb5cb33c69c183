use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::BadgeLevel;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "badges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub description: String,
    pub level: BadgeLevel,
    pub icon_url: Option<String>,
    /// JSON-encoded award criteria
    pub criteria: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    #[serde(skip)]
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::badge_progress::Entity")]
    BadgeProgress,
}

impl Related<super::badge_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BadgeProgress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
