//! SeaORM entity models
//!
//! Database entities for the Research Kernel

pub mod agent_message;
pub mod citation;
pub mod client;
pub mod conversation;
pub mod embedding_model;
pub mod embedding_model_llm;
pub mod enums;
pub mod llm;
pub mod message_base;
pub mod message_content;
pub mod research_context;
pub mod source_data;
pub mod source_data_research_context;
pub mod user_message;
pub mod vector_store;

pub use enums::{MessageKind, Protocol, SourceDataStatus};

pub use client::{
    Entity as ClientEntity,
    Model as Client,
    ActiveModel as ClientActiveModel,
    Column as ClientColumn,
};

pub use llm::{
    Entity as LlmEntity,
    Model as Llm,
    ActiveModel as LlmActiveModel,
    Column as LlmColumn,
};

pub use embedding_model::{
    Entity as EmbeddingModelEntity,
    Model as EmbeddingModel,
    ActiveModel as EmbeddingModelActiveModel,
    Column as EmbeddingModelColumn,
};

pub use research_context::{
    Entity as ResearchContextEntity,
    Model as ResearchContext,
    ActiveModel as ResearchContextActiveModel,
    Column as ResearchContextColumn,
};

pub use vector_store::{
    Entity as VectorStoreEntity,
    Model as VectorStore,
    ActiveModel as VectorStoreActiveModel,
    Column as VectorStoreColumn,
    Lfn,
};

pub use source_data::{
    Entity as SourceDataEntity,
    Model as SourceData,
    ActiveModel as SourceDataActiveModel,
    Column as SourceDataColumn,
};

pub use conversation::{
    Entity as ConversationEntity,
    Model as Conversation,
    ActiveModel as ConversationActiveModel,
    Column as ConversationColumn,
};

pub use message_base::{
    Entity as MessageBaseEntity,
    Model as MessageBase,
    ActiveModel as MessageBaseActiveModel,
    Column as MessageBaseColumn,
};

pub use message_content::{
    Entity as MessageContentEntity,
    Model as MessageContent,
    ActiveModel as MessageContentActiveModel,
    Column as MessageContentColumn,
};

pub use citation::{
    Entity as CitationEntity,
    Model as Citation,
    ActiveModel as CitationActiveModel,
    Column as CitationColumn,
};
