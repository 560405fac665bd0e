//! Base row of the message hierarchy
//!
//! Every message has a row here. `type` names the variant, whose own table
//! (`user_message`, `agent_message`) shares the primary key.

use super::enums::MessageKind;
use crate::db::base::{current, model_base};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message_base")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub thread_id: i32,

    pub timestamp: DateTimeUtc,

    /// Stored [`MessageKind`] discriminator
    #[sea_orm(column_name = "type", column_type = "Text")]
    #[serde(rename = "type")]
    pub kind: String,

    pub conversation_id: i32,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,

    pub deleted: bool,

    pub deleted_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn kind(&self) -> crate::errors::Result<MessageKind> {
        self.kind.parse()
    }
}

fn validate(active: &ActiveModel) -> crate::errors::Result<()> {
    if let Some(kind) = current(&active.kind) {
        kind.parse::<MessageKind>()?;
    }
    Ok(())
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::conversation::Entity",
        from = "Column::ConversationId",
        to = "super::conversation::Column::Id"
    )]
    Conversation,

    #[sea_orm(has_many = "super::message_content::Entity")]
    Contents,

    #[sea_orm(has_one = "super::user_message::Entity")]
    UserMessage,

    #[sea_orm(has_one = "super::agent_message::Entity")]
    AgentMessage,
}

impl Related<super::conversation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Conversation.def()
    }
}

impl Related<super::message_content::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contents.def()
    }
}

impl Related<super::user_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserMessage.def()
    }
}

impl Related<super::agent_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AgentMessage.def()
    }
}

model_base!(soft, validate = validate);
