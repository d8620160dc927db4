use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bulk_api_operations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub action: String,
    pub filters: String,  // JSON document keyed by action
    pub payload: String,  // JSON document keyed by action
    #[sea_orm(default_value = "PENDING")]
    pub status: String, // PENDING, IN_PROGRESS, COMPLETED, FAILED, KILLED
    pub created_by_id: i32,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub matched_count: i32,
    pub record_ids: String, // JSON array, admission order
    pub success_count: i32,
    pub failure_count: i32,
    pub snapshot: Option<String>,
    pub errors: Option<String>,       // JSON array of strings
    pub success_list: Option<String>, // JSON array of outcome entries
    pub failure_list: Option<String>, // JSON array of outcome entries
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedById",
        to = "super::user::Column::Id"
    )]
    CreatedBy,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreatedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
