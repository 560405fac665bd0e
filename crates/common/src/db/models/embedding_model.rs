//! Embedding model entity

use crate::db::base::model_base;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "embedding_model")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text", unique)]
    pub name: String,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,

    pub deleted: bool,

    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vector_store::Entity")]
    VectorStores,
}

impl Related<super::vector_store::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VectorStores.def()
    }
}

impl Related<super::llm::Entity> for Entity {
    fn to() -> RelationDef {
        super::embedding_model_llm::Relation::Llm.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::embedding_model_llm::Relation::EmbeddingModel.def().rev())
    }
}

model_base!(soft);
