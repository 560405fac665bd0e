//! Citation of a source data item by an agent message

use crate::db::base::model_base;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "citation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub source_data_id: i32,

    /// Free-form locator within the source, e.g. page and span
    #[sea_orm(column_type = "Text")]
    pub citation_metadata: String,

    pub agent_message_id: i32,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,

    pub deleted: bool,

    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::source_data::Entity",
        from = "Column::SourceDataId",
        to = "super::source_data::Column::Id"
    )]
    SourceData,

    #[sea_orm(
        belongs_to = "super::agent_message::Entity",
        from = "Column::AgentMessageId",
        to = "super::agent_message::Column::Id"
    )]
    AgentMessage,
}

impl Related<super::source_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SourceData.def()
    }
}

impl Related<super::agent_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AgentMessage.def()
    }
}

model_base!(soft);
