//! Association between embedding models and the LLMs that use them

use crate::db::Session;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "embedding_model_llm_association")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub embedding_model_id: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub llm_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::embedding_model::Entity",
        from = "Column::EmbeddingModelId",
        to = "super::embedding_model::Column::Id",
        on_delete = "Cascade"
    )]
    EmbeddingModel,

    #[sea_orm(
        belongs_to = "super::llm::Entity",
        from = "Column::LlmId",
        to = "super::llm::Column::Id",
        on_delete = "Cascade"
    )]
    Llm,
}

impl ActiveModelBehavior for ActiveModel {}

/// Record that `llm_id` uses `embedding_model_id`
pub async fn link(session: &Session, embedding_model_id: i32, llm_id: i32) -> crate::errors::Result<()> {
    session.flush().await?;
    ActiveModel {
        embedding_model_id: Set(embedding_model_id),
        llm_id: Set(llm_id),
    }
    .insert(session.conn())
    .await?;
    Ok(())
}

/// Remove the link; returns whether one existed
pub async fn unlink(session: &Session, embedding_model_id: i32, llm_id: i32) -> crate::errors::Result<bool> {
    session.flush().await?;
    let result = Entity::delete_by_id((embedding_model_id, llm_id))
        .exec(session.conn())
        .await?;
    Ok(result.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{embedding_model, llm};
    use crate::db::testing;

    #[tokio::test]
    async fn test_link_and_unlink() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();
        let model = embedding_model::ActiveModel {
            name: Set("text-embedding".to_string()),
            ..Default::default()
        }
        .save(true, Some(&session))
        .await
        .unwrap()
        .unwrap();
        let chat = llm::ActiveModel {
            llm_name: Set("chat".to_string()),
            ..Default::default()
        }
        .save(true, Some(&session))
        .await
        .unwrap()
        .unwrap();

        link(&session, model.id, chat.id).await.unwrap();
        let related = chat
            .find_related(embedding_model::Entity)
            .all(session.conn())
            .await
            .unwrap();
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].id, model.id);

        assert!(link(&session, model.id, chat.id).await.unwrap_err().is_constraint_violation());
        assert!(unlink(&session, model.id, chat.id).await.unwrap());
        assert!(!unlink(&session, model.id, chat.id).await.unwrap());
    }
}
