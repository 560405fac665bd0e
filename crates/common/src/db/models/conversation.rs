//! Conversation entity

use crate::db::base::model_base;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conversation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub title: Option<String>,

    pub research_context_id: i32,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,

    pub deleted: bool,

    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::research_context::Entity",
        from = "Column::ResearchContextId",
        to = "super::research_context::Column::Id"
    )]
    ResearchContext,

    #[sea_orm(has_many = "super::message_base::Entity")]
    Messages,
}

impl Related<super::research_context::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResearchContext.def()
    }
}

impl Related<super::message_base::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

model_base!(soft);
