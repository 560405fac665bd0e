//! Polymorphic messages
//!
//! A message is a `message_base` row whose `type` column names its variant.
//! User and agent messages add a row in their own table under the same id;
//! agent messages also carry citations of source data. Writers go through
//! [`NewMessage`], which sets the discriminator from the variant it creates.
//! Readers decode the discriminator here, at the storage boundary.

use crate::db::base::Visibility;
use crate::db::models::{
    agent_message, citation, message_base, message_content, source_data, user_message, MessageKind,
};
use crate::db::Session;
use crate::errors::{AppError, Result};
use crate::metrics::record_write;
use chrono::{DateTime, SubsecRound, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;
use tracing::debug;

/// Message without a variant row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseMessage {
    pub base: message_base::Model,
    pub contents: Vec<message_content::Model>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserMessage {
    pub base: message_base::Model,
    pub contents: Vec<message_content::Model>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentMessage {
    pub base: message_base::Model,
    pub contents: Vec<message_content::Model>,
    pub citations: Vec<citation::Model>,
    /// Distinct source data referenced by `citations`
    pub source_data: Vec<source_data::Model>,
}

/// A message decoded by its stored discriminator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "message_base")]
    Base(BaseMessage),
    #[serde(rename = "user_message")]
    User(UserMessage),
    #[serde(rename = "agent_message")]
    Agent(AgentMessage),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Base(_) => MessageKind::MessageBase,
            Message::User(_) => MessageKind::UserMessage,
            Message::Agent(_) => MessageKind::AgentMessage,
        }
    }

    pub fn base(&self) -> &message_base::Model {
        match self {
            Message::Base(m) => &m.base,
            Message::User(m) => &m.base,
            Message::Agent(m) => &m.base,
        }
    }

    pub fn id(&self) -> i32 {
        self.base().id
    }

    pub fn contents(&self) -> &[message_content::Model] {
        match self {
            Message::Base(m) => &m.contents,
            Message::User(m) => &m.contents,
            Message::Agent(m) => &m.contents,
        }
    }

    /// Load the message with id `id`, or `None` when no visible base row exists.
    pub async fn find_by_id<C>(conn: &C, id: i32, visibility: Visibility) -> Result<Option<Message>>
    where
        C: ConnectionTrait,
    {
        let base = visibility
            .apply(message_base::Entity::find_by_id(id))
            .one(conn)
            .await?;

        match base {
            Some(base) => Self::load(conn, base, visibility).await.map(Some),
            None => Ok(None),
        }
    }

    /// Decode `base` and load its variant row and children
    pub async fn load<C>(conn: &C, base: message_base::Model, visibility: Visibility) -> Result<Message>
    where
        C: ConnectionTrait,
    {
        let kind = base.kind()?;
        let contents = visibility
            .apply(base.find_related(message_content::Entity))
            .order_by_asc(message_content::Column::Id)
            .all(conn)
            .await?;

        match kind {
            MessageKind::MessageBase => Ok(Message::Base(BaseMessage { base, contents })),
            MessageKind::UserMessage => {
                base.find_related(user_message::Entity)
                    .one(conn)
                    .await?
                    .ok_or_else(|| incomplete(&base))?;
                Ok(Message::User(UserMessage { base, contents }))
            }
            MessageKind::AgentMessage => {
                let agent = base
                    .find_related(agent_message::Entity)
                    .one(conn)
                    .await?
                    .ok_or_else(|| incomplete(&base))?;

                let citations = visibility
                    .apply(agent.find_related(citation::Entity))
                    .order_by_asc(citation::Column::Id)
                    .all(conn)
                    .await?;
                let source_data = cited_source_data(conn, &citations, visibility).await?;

                Ok(Message::Agent(AgentMessage {
                    base,
                    contents,
                    citations,
                    source_data,
                }))
            }
        }
    }
}

/// Source data referenced by `citations`, each once, ordered by id
async fn cited_source_data<C>(
    conn: &C,
    citations: &[citation::Model],
    visibility: Visibility,
) -> Result<Vec<source_data::Model>>
where
    C: ConnectionTrait,
{
    let mut ids: Vec<i32> = citations.iter().map(|c| c.source_data_id).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    visibility
        .apply(source_data::Entity::find().filter(source_data::Column::Id.is_in(ids)))
        .order_by_asc(source_data::Column::Id)
        .all(conn)
        .await
        .map_err(Into::into)
}

fn incomplete(base: &message_base::Model) -> AppError {
    AppError::IncompleteMessage {
        id: base.id,
        kind: base.kind.clone(),
    }
}

/// A citation to attach to a new agent message
#[derive(Debug, Clone)]
pub struct NewCitation {
    pub source_data_id: i32,
    pub citation_metadata: String,
}

/// Builder for a message in `conversation_id`.
///
/// Every create method flushes the session: the base row must exist before its
/// variant row and children can reference its id.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: i32,
    pub thread_id: i32,
    pub timestamp: DateTime<Utc>,
    pub contents: Vec<String>,
}

impl NewMessage {
    pub fn new(conversation_id: i32, thread_id: i32) -> Self {
        Self {
            conversation_id,
            thread_id,
            timestamp: Utc::now().trunc_subsecs(6),
            contents: Vec::new(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.contents.push(content.into());
        self
    }

    pub async fn create_base(self, session: Option<&Session>) -> Result<BaseMessage> {
        let session = crate::db::base::require(session, "save")?;
        let (base, contents) = self.write_base(MessageKind::MessageBase, session).await?;
        Ok(BaseMessage { base, contents })
    }

    pub async fn create_user(self, session: Option<&Session>) -> Result<UserMessage> {
        let session = crate::db::base::require(session, "save")?;
        let (base, contents) = self.write_base(MessageKind::UserMessage, session).await?;

        user_message::ActiveModel { id: Set(base.id) }
            .insert(session.conn())
            .await?;
        record_write("user_message", "insert");

        Ok(UserMessage { base, contents })
    }

    pub async fn create_agent(
        self,
        citations: Vec<NewCitation>,
        session: Option<&Session>,
    ) -> Result<AgentMessage> {
        let session = crate::db::base::require(session, "save")?;
        let (base, contents) = self.write_base(MessageKind::AgentMessage, session).await?;

        agent_message::ActiveModel { id: Set(base.id) }
            .insert(session.conn())
            .await?;
        record_write("agent_message", "insert");

        let mut written = Vec::with_capacity(citations.len());
        for cite in citations {
            let row = citation::ActiveModel {
                source_data_id: Set(cite.source_data_id),
                citation_metadata: Set(cite.citation_metadata),
                agent_message_id: Set(base.id),
                ..Default::default()
            }
            .save(true, Some(session))
            .await?;
            written.push(flushed(row, "citation")?);
        }

        let source_data = cited_source_data(session.conn(), &written, Visibility::All).await?;

        Ok(AgentMessage {
            base,
            contents,
            citations: written,
            source_data,
        })
    }

    async fn write_base(
        self,
        kind: MessageKind,
        session: &Session,
    ) -> Result<(message_base::Model, Vec<message_content::Model>)> {
        let base = message_base::ActiveModel {
            thread_id: Set(self.thread_id),
            timestamp: Set(self.timestamp),
            kind: Set(kind.into()),
            conversation_id: Set(self.conversation_id),
            ..Default::default()
        }
        .save(true, Some(session))
        .await?;
        let base = flushed(base, "message_base")?;

        let mut contents = Vec::with_capacity(self.contents.len());
        for content in self.contents {
            let row = message_content::ActiveModel {
                content: Set(content),
                message_id: Set(base.id),
                ..Default::default()
            }
            .save(true, Some(session))
            .await?;
            contents.push(flushed(row, "message_content")?);
        }

        debug!(message_id = base.id, kind = %kind, "Created message");
        Ok((base, contents))
    }
}

impl From<BaseMessage> for Message {
    fn from(message: BaseMessage) -> Self {
        Message::Base(message)
    }
}

impl From<UserMessage> for Message {
    fn from(message: UserMessage) -> Self {
        Message::User(message)
    }
}

impl From<AgentMessage> for Message {
    fn from(message: AgentMessage) -> Self {
        Message::Agent(message)
    }
}

/// A flushing save always returns the stored row
fn flushed<M>(row: Option<M>, table: &str) -> Result<M> {
    row.ok_or_else(|| AppError::NotFound {
        resource_type: table.to_string(),
        id: "unflushed".to_string(),
    })
}
