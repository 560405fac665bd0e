//! Variant table for messages produced by the agent

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "agent_message")]
pub struct Model {
    /// Same id as the `message_base` row
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::message_base::Entity",
        from = "Column::Id",
        to = "super::message_base::Column::Id",
        on_delete = "Cascade"
    )]
    MessageBase,

    #[sea_orm(has_many = "super::citation::Entity")]
    Citations,
}

impl Related<super::message_base::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MessageBase.def()
    }
}

impl Related<super::citation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Citations.def()
    }
}

/// Source data cited by this message
impl Related<super::source_data::Entity> for Entity {
    fn to() -> RelationDef {
        super::citation::Relation::SourceData.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::citation::Relation::AgentMessage.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
