//! Vector store entity and its LFN locator
//!
//! Vector stores are physically deleted. `lfn` holds a serialized [`Lfn`]
//! and is unique across stores.

use super::enums::Protocol;
use crate::db::base::{current, model_base};
use crate::errors::AppError;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

/// Logical file name: where a vector store's backing data lives
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Lfn {
    pub protocol: Protocol,
    pub tracer_id: String,
    pub job_id: i64,
    pub source: String,
    pub relative_path: String,
}

impl Lfn {
    pub fn to_json(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn parse(serialized: &str) -> crate::errors::Result<Self> {
        let lfn: Lfn = serde_json::from_str(serialized).map_err(|e| AppError::InvalidLfn {
            message: e.to_string(),
        })?;
        if lfn.relative_path.is_empty() {
            return Err(AppError::InvalidLfn {
                message: "relative_path is empty".to_string(),
            });
        }
        Ok(lfn)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vector_store")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text", unique)]
    pub lfn: String,

    pub research_context_id: Option<i32>,

    pub embedding_model_id: i32,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn locator(&self) -> crate::errors::Result<Lfn> {
        Lfn::parse(&self.lfn)
    }
}

/// Unsaved vector store located at `lfn`
pub fn draft(
    name: &str,
    lfn: &Lfn,
    research_context_id: Option<i32>,
    embedding_model_id: i32,
) -> crate::errors::Result<ActiveModel> {
    Ok(ActiveModel {
        name: Set(name.to_string()),
        lfn: Set(lfn.to_json()?),
        research_context_id: Set(research_context_id),
        embedding_model_id: Set(embedding_model_id),
        ..Default::default()
    })
}

fn validate(active: &ActiveModel) -> crate::errors::Result<()> {
    if let Some(lfn) = current(&active.lfn) {
        Lfn::parse(lfn)?;
    }
    Ok(())
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::research_context::Entity",
        from = "Column::ResearchContextId",
        to = "super::research_context::Column::Id"
    )]
    ResearchContext,

    #[sea_orm(
        belongs_to = "super::embedding_model::Entity",
        from = "Column::EmbeddingModelId",
        to = "super::embedding_model::Column::Id"
    )]
    EmbeddingModel,
}

impl Related<super::research_context::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResearchContext.def()
    }
}

impl Related<super::embedding_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmbeddingModel.def()
    }
}

model_base!(hard, validate = validate);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::embedding_model;
    use crate::db::testing;
    use crate::errors::ConstraintKind;

    fn lfn(path: &str) -> Lfn {
        Lfn {
            protocol: Protocol::S3,
            tracer_id: "tracer".to_string(),
            job_id: 7,
            source: "vector_store".to_string(),
            relative_path: path.to_string(),
        }
    }

    #[test]
    fn test_lfn_round_trips_through_text() {
        let original = lfn("stores/1");
        let parsed = Lfn::parse(&original.to_json().unwrap()).unwrap();
        assert_eq!(parsed, original);

        assert!(matches!(Lfn::parse("stores/1"), Err(AppError::InvalidLfn { .. })));
        assert!(matches!(Lfn::parse(&lfn("").to_json().unwrap()), Err(AppError::InvalidLfn { .. })));
    }

    #[tokio::test]
    async fn test_vector_store_is_physically_deleted() {
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

        let store = draft("store", &lfn("stores/1"), None, model.id)
            .unwrap()
            .save(true, Some(&session))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.locator().unwrap().relative_path, "stores/1");

        let id = store.id;
        store.delete(true, Some(&session)).await.unwrap();
        assert!(Entity::find_by_id(id).one(session.conn()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lfn_is_validated_and_unique() {
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

        let malformed = ActiveModel {
            name: Set("store".to_string()),
            lfn: Set("s3://bucket/key".to_string()),
            research_context_id: Set(None),
            embedding_model_id: Set(model.id),
            ..Default::default()
        };
        let err = malformed.save(true, Some(&session)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidLfn { .. }));

        draft("first", &lfn("stores/1"), None, model.id)
            .unwrap()
            .save(true, Some(&session))
            .await
            .unwrap();
        let err = draft("second", &lfn("stores/1"), None, model.id)
            .unwrap()
            .save(true, Some(&session))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::ConstraintViolation { kind: ConstraintKind::Unique, .. }
        ));
    }
}
