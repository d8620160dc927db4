use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub country: String, // ISO3
    #[sea_orm(default_value = "UNDER_REVIEW")]
    pub review_status: String, // UNDER_REVIEW, REVIEW_IN_PROGRESS, SIGNED_OFF
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::figure::Entity")]
    Figures,
}

impl Related<super::figure::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Figures.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
