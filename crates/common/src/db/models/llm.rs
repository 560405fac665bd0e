//! LLM entity

use crate::db::base::model_base;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "llm")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text", unique)]
    pub llm_name: String,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,

    pub deleted: bool,

    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::research_context::Entity")]
    ResearchContexts,
}

impl Related<super::research_context::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResearchContexts.def()
    }
}

impl Related<super::embedding_model::Entity> for Entity {
    fn to() -> RelationDef {
        super::embedding_model_llm::Relation::EmbeddingModel.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::embedding_model_llm::Relation::Llm.def().rev())
    }
}

model_base!(soft);
