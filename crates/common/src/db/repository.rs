//! Repository pattern for read access
//!
//! Read helpers over the pool. Every helper takes an explicit [`Visibility`];
//! soft-deleted rows are never hidden behind the caller's back.

use crate::db::base::Visibility;
use crate::db::message::Message;
use crate::db::models::*;
use crate::db::DbPool;
use crate::dto::ListSourceDataDto;
use crate::errors::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder};

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Client Operations
    // ========================================================================

    /// Find client by its identity provider subject
    pub async fn find_client_by_sub(&self, sub: &str, visibility: Visibility) -> Result<Option<Client>> {
        visibility
            .apply(ClientEntity::find().filter(ClientColumn::Sub.eq(sub)))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Source Data Operations
    // ========================================================================

    /// List a client's source data, oldest first
    pub async fn list_source_data(&self, client_id: i32, visibility: Visibility) -> Result<ListSourceDataDto> {
        let data = visibility
            .apply(SourceDataEntity::find().filter(SourceDataColumn::ClientId.eq(client_id)))
            .order_by_asc(SourceDataColumn::Id)
            .all(self.conn())
            .await?;

        Ok(data.into())
    }

    /// List the source data linked to a research context
    pub async fn list_research_context_source_data(
        &self,
        research_context_id: i32,
        visibility: Visibility,
    ) -> Result<ListSourceDataDto> {
        let Some(context) = visibility
            .apply(ResearchContextEntity::find_by_id(research_context_id))
            .one(self.conn())
            .await?
        else {
            return Ok(ListSourceDataDto::default());
        };

        let data = visibility
            .apply(context.find_related(SourceDataEntity))
            .order_by_asc(SourceDataColumn::Id)
            .all(self.conn())
            .await?;

        Ok(data.into())
    }

    // ========================================================================
    // Message Operations
    // ========================================================================

    /// Find a message by ID, decoded to its variant
    pub async fn find_message(&self, id: i32, visibility: Visibility) -> Result<Option<Message>> {
        Message::find_by_id(self.conn(), id, visibility).await
    }

    /// List a conversation's messages with their contents, in timestamp order
    pub async fn list_conversation_messages(
        &self,
        conversation_id: i32,
        visibility: Visibility,
    ) -> Result<Vec<Message>> {
        let bases = visibility
            .apply(MessageBaseEntity::find().filter(MessageBaseColumn::ConversationId.eq(conversation_id)))
            .order_by_asc(MessageBaseColumn::Timestamp)
            .order_by_asc(MessageBaseColumn::Id)
            .all(self.conn())
            .await?;

        let mut messages = Vec::with_capacity(bases.len());
        for base in bases {
            messages.push(Message::load(self.conn(), base, visibility).await?);
        }
        Ok(messages)
    }
}
