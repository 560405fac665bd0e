//! Schema bootstrap
//!
//! DDL is derived from the entity declarations, so the tables always match
//! the models. Every statement is `IF NOT EXISTS` and `create_all` can run on
//! each start.

use crate::db::models::{
    agent_message, citation, client, conversation, embedding_model, embedding_model_llm, llm,
    message_base, message_content, research_context, source_data, source_data_research_context,
    user_message, vector_store,
};
use crate::errors::Result;
use sea_orm::sea_query::{Alias, Expr, Index};
use sea_orm::{ConnectionTrait, EntityTrait, Schema};
use tracing::{debug, info};

/// Tables in creation order; each only references tables before it
pub const TABLES: &[&str] = &[
    "client",
    "llm",
    "embedding_model",
    "embedding_model_llm_association",
    "research_context",
    "vector_store",
    "source_data",
    "source_data_research_context_association",
    "conversation",
    "message_base",
    "user_message",
    "agent_message",
    "citation",
    "message_content",
];

/// Bookkeeping columns a table carries, which get CHECK constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audit {
    None,
    Timestamps,
    SoftDelete,
}

impl Audit {
    fn checked_columns(self) -> &'static [&'static str] {
        match self {
            Audit::None => &[],
            Audit::Timestamps => &["created_at", "updated_at"],
            Audit::SoftDelete => &["created_at", "updated_at", "deleted"],
        }
    }
}

/// Create every table and index that does not exist yet
pub async fn create_all<C: ConnectionTrait>(conn: &C) -> Result<()> {
    let schema = Schema::new(conn.get_database_backend());

    create_table(conn, &schema, client::Entity, Audit::SoftDelete).await?;
    create_table(conn, &schema, llm::Entity, Audit::SoftDelete).await?;
    create_table(conn, &schema, embedding_model::Entity, Audit::SoftDelete).await?;
    create_table(conn, &schema, embedding_model_llm::Entity, Audit::None).await?;
    create_table(conn, &schema, research_context::Entity, Audit::SoftDelete).await?;
    create_table(conn, &schema, vector_store::Entity, Audit::Timestamps).await?;
    create_table(conn, &schema, source_data::Entity, Audit::SoftDelete).await?;
    create_table(conn, &schema, source_data_research_context::Entity, Audit::None).await?;
    create_table(conn, &schema, conversation::Entity, Audit::SoftDelete).await?;
    create_table(conn, &schema, message_base::Entity, Audit::SoftDelete).await?;
    create_table(conn, &schema, user_message::Entity, Audit::None).await?;
    create_table(conn, &schema, agent_message::Entity, Audit::None).await?;
    create_table(conn, &schema, citation::Entity, Audit::SoftDelete).await?;
    create_table(conn, &schema, message_content::Entity, Audit::SoftDelete).await?;

    let index = Index::create()
        .name(source_data::UNIQUE_LOCATION_INDEX)
        .table(source_data::Entity)
        .col(source_data::Column::ClientId)
        .col(source_data::Column::RelativePath)
        .col(source_data::Column::Protocol)
        .unique()
        .if_not_exists()
        .to_owned();
    conn.execute(conn.get_database_backend().build(&index)).await?;

    info!(tables = TABLES.len(), "Schema ready");
    Ok(())
}

async fn create_table<C, E>(conn: &C, schema: &Schema, entity: E, audit: Audit) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    for column in audit.checked_columns() {
        table.check(Expr::col(Alias::new(*column)).is_not_null());
    }

    conn.execute(conn.get_database_backend().build(&table)).await?;
    debug!(table = entity.table_name(), "Ensured table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;
    use sea_orm::Statement;

    async fn table_names(pool: &crate::db::DbPool) -> Vec<String> {
        let backend = pool.conn().get_database_backend();
        pool.conn()
            .query_all(Statement::from_string(
                backend,
                "SELECT name FROM sqlite_master WHERE type = 'table'",
            ))
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.try_get::<String>("", "name").unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_create_all_is_idempotent() {
        let pool = testing::pool().await;
        create_all(pool.conn()).await.unwrap();

        let names = table_names(&pool).await;
        for table in TABLES {
            assert!(names.iter().any(|n| n == table), "missing table {table}");
        }
    }

    #[tokio::test]
    async fn test_unique_location_index_exists() {
        let pool = testing::pool().await;
        let backend = pool.conn().get_database_backend();
        let row = pool
            .conn()
            .query_one(Statement::from_string(
                backend,
                format!(
                    "SELECT name FROM sqlite_master WHERE type = 'index' AND name = '{}'",
                    source_data::UNIQUE_LOCATION_INDEX
                ),
            ))
            .await
            .unwrap();
        assert!(row.is_some());
    }

    #[tokio::test]
    async fn test_null_timestamps_are_rejected() {
        let pool = testing::pool().await;
        let err = pool
            .conn()
            .execute_unprepared(
                "INSERT INTO client (sub, created_at, updated_at, deleted) VALUES ('x', NULL, NULL, false)",
            )
            .await
            .unwrap_err();
        let err = crate::errors::AppError::from(err);
        assert!(err.is_constraint_violation());
    }
}
