//! Research context entity

use crate::db::base::model_base;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "research_context")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub client_id: i32,

    /// LLM answering within this context
    pub llm_id: i32,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,

    pub deleted: bool,

    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,

    #[sea_orm(
        belongs_to = "super::llm::Entity",
        from = "Column::LlmId",
        to = "super::llm::Column::Id"
    )]
    Llm,

    #[sea_orm(has_one = "super::vector_store::Entity")]
    VectorStore,

    #[sea_orm(has_many = "super::conversation::Entity")]
    Conversations,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::llm::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Llm.def()
    }
}

impl Related<super::vector_store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VectorStore.def()
    }
}

impl Related<super::conversation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Conversations.def()
    }
}

impl Related<super::source_data::Entity> for Entity {
    fn to() -> RelationDef {
        super::source_data_research_context::Relation::SourceData.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::source_data_research_context::Relation::ResearchContext.def().rev())
    }
}

model_base!(soft);
