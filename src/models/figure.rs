use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::Figure;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "figures")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub event_id: i32,
    pub entry_id: i32,
    pub country: String, // ISO3
    /// Displacement category, e.g. `IDPS`, `NEW_DISPLACEMENT`, `RETURNEES`.
    pub category: String,
    #[sea_orm(default_value = "RECOMMENDED")]
    pub role: String, // RECOMMENDED, TRIANGULATION
    /// Whether the figure feeds the Internal Displacement Updates.
    pub include_idu: bool,
    pub quantity: i64,
    pub last_modified_by_id: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Event,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Figure {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            event_id: model.event_id,
            entry_id: model.entry_id,
            country: model.country,
            category: model.category,
            role: model.role,
            include_idu: model.include_idu,
            quantity: model.quantity,
            last_modified_by_id: model.last_modified_by_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
