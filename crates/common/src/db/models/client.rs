//! Client entity

use crate::db::base::model_base;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "client")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// External subject identifier from the identity provider
    #[sea_orm(column_type = "Text", unique)]
    pub sub: String,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,

    pub deleted: bool,

    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::research_context::Entity")]
    ResearchContexts,

    /// Owned: purging a client removes its source data
    #[sea_orm(has_many = "super::source_data::Entity")]
    SourceData,
}

impl Related<super::research_context::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResearchContexts.def()
    }
}

impl Related<super::source_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SourceData.def()
    }
}

model_base!(soft);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::source_data;
    use crate::db::{testing, SoftDeleted, Visibility};
    use crate::errors::{AppError, ConstraintKind};
    use sea_orm::Set;

    fn draft(sub: &str) -> ActiveModel {
        ActiveModel {
            sub: Set(sub.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_every_primitive_requires_session() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();
        let saved = draft("a").save(true, Some(&session)).await.unwrap().unwrap();

        let no_session = |err: AppError| matches!(err, AppError::NoSession { .. });
        assert!(no_session(draft("b").save(true, None).await.unwrap_err()));
        assert!(no_session(draft("b").save(false, None).await.unwrap_err()));
        assert!(no_session(saved.clone().save(true, None).await.unwrap_err()));
        assert!(no_session(
            saved
                .clone()
                .update([("sub", serde_json::json!("c"))], true, None)
                .await
                .unwrap_err()
        ));
        assert!(no_session(saved.clone().delete(true, None).await.unwrap_err()));
        assert!(no_session(saved.purge(false, None).await.unwrap_err()));
        assert_eq!(session.pending().await, 0);
    }

    #[tokio::test]
    async fn test_save_stamps_timestamps() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();

        let saved = draft("a").save(true, Some(&session)).await.unwrap().unwrap();
        assert!(!saved.deleted);
        assert!(saved.deleted_at.is_none());
        assert_eq!(saved.created_at, saved.updated_at);

        let resaved = saved.clone().save(true, Some(&session)).await.unwrap().unwrap();
        assert_eq!(resaved.created_at, saved.created_at);
        assert!(resaved.updated_at > saved.updated_at);
    }

    #[tokio::test]
    async fn test_staged_writes_invisible_until_flush() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();

        let staged = draft("staged").save(false, Some(&session)).await.unwrap();
        assert!(staged.is_none());
        assert_eq!(session.pending().await, 1);
        assert!(Entity::find().all(session.conn()).await.unwrap().is_empty());

        session.flush().await.unwrap();
        assert_eq!(session.pending().await, 0);
        assert_eq!(Entity::find().all(session.conn()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_flushing_save_applies_staged_writes_first() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();

        draft("first").save(false, Some(&session)).await.unwrap();
        let second = draft("second").save(true, Some(&session)).await.unwrap().unwrap();
        let first = Entity::find()
            .filter(Column::Sub.eq("first"))
            .one(session.conn())
            .await
            .unwrap()
            .unwrap();
        assert!(first.id < second.id);
    }

    #[tokio::test]
    async fn test_sub_is_unique() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();

        draft("same").save(true, Some(&session)).await.unwrap();
        let err = draft("same").save(true, Some(&session)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::ConstraintViolation { kind: ConstraintKind::Unique, .. }
        ));
    }

    #[tokio::test]
    async fn test_soft_delete_keeps_row() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();
        let saved = draft("a").save(true, Some(&session)).await.unwrap().unwrap();
        let id = saved.id;

        let deleted = saved.delete(true, Some(&session)).await.unwrap().unwrap();
        assert!(deleted.is_deleted());
        assert!(deleted.deleted_at().unwrap() >= deleted.created_at);

        let row = Entity::find_by_id(id).one(session.conn()).await.unwrap().unwrap();
        assert!(row.deleted);
        assert!(Visibility::Live
            .apply(Entity::find_by_id(id))
            .one(session.conn())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_purge_cascades_to_source_data() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();
        let owner = draft("owner").save(true, Some(&session)).await.unwrap().unwrap();
        let data = testing::source_data(&session, owner.id, "a.pdf").await;

        owner.purge(true, Some(&session)).await.unwrap();
        assert!(source_data::Entity::find_by_id(data.id)
            .one(session.conn())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_writing_a_purged_row_is_stale() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();
        let saved = draft("a").save(true, Some(&session)).await.unwrap().unwrap();

        saved.clone().purge(true, Some(&session)).await.unwrap();
        let err = saved.clone().save(true, Some(&session)).await.unwrap_err();
        assert!(matches!(err, AppError::StaleRecord { .. }));
        let err = saved.purge(true, Some(&session)).await.unwrap_err();
        assert!(matches!(err, AppError::StaleRecord { .. }));
    }

    #[tokio::test]
    async fn test_field_access_by_name() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();
        let saved = draft("a").save(true, Some(&session)).await.unwrap().unwrap();

        assert_eq!(
            saved.keys(),
            vec!["id", "sub", "created_at", "updated_at", "deleted", "deleted_at"]
        );
        let items = saved.items().unwrap();
        assert_eq!(items[1].0, "sub");
        assert_eq!(items[1].1, serde_json::json!("a"));
        assert_eq!(saved.values().unwrap().len(), items.len());
        assert_eq!(saved.to_dict().unwrap()["deleted"], serde_json::json!(false));
        assert!(matches!(saved.get("nope"), Err(AppError::UnknownField { .. })));
    }

    #[tokio::test]
    async fn test_commit_persists_and_rollback_discards() {
        let pool = testing::pool().await;

        let session = pool.begin().await.unwrap();
        draft("kept").save(false, Some(&session)).await.unwrap();
        session.commit().await.unwrap();

        let session = pool.begin().await.unwrap();
        draft("flushed").save(true, Some(&session)).await.unwrap();
        draft("staged").save(false, Some(&session)).await.unwrap();
        session.rollback().await.unwrap();

        let subs: Vec<String> = Entity::find()
            .all(pool.conn())
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.sub)
            .collect();
        assert_eq!(subs, vec!["kept".to_string()]);
    }

    #[tokio::test]
    async fn test_primary_key_cannot_be_updated_by_name() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();
        let a = draft("a").save(true, Some(&session)).await.unwrap().unwrap();
        let b = draft("b").save(true, Some(&session)).await.unwrap().unwrap();

        let err = a
            .clone()
            .update([("id", serde_json::json!(b.id))], true, Some(&session))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFieldValue { .. }));

        let mut renamed = a.clone();
        assert!(matches!(
            renamed.set("id", serde_json::json!(b.id)),
            Err(AppError::InvalidFieldValue { .. })
        ));
        assert_eq!(renamed, a);

        let untouched = Entity::find_by_id(b.id).one(session.conn()).await.unwrap().unwrap();
        assert_eq!(untouched, b);
    }
}
