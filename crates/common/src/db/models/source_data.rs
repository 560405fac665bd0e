//! Source data entity
//!
//! A file or object a client registered, reachable through `protocol` at
//! `relative_path`. The triple (client_id, relative_path, protocol) is unique;
//! the index is created with the schema.

use super::enums::{Protocol, SourceDataStatus};
use crate::db::base::{current, model_base};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

/// Name of the composite unique index on (client_id, relative_path, protocol)
pub const UNIQUE_LOCATION_INDEX: &str = "uix_client_id_relative_path_protocol";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "source_data")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub relative_path: String,

    /// Media type of the data, e.g. `pdf`
    #[sea_orm(column_name = "type", column_type = "Text")]
    #[serde(rename = "type")]
    pub data_type: String,

    /// Stored [`Protocol`] name
    #[sea_orm(column_type = "Text")]
    pub protocol: String,

    /// Stored [`SourceDataStatus`] name
    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub client_id: i32,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,

    pub deleted: bool,

    pub deleted_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn protocol(&self) -> crate::errors::Result<Protocol> {
        self.protocol.parse()
    }

    pub fn status(&self) -> crate::errors::Result<SourceDataStatus> {
        self.status.parse()
    }
}

/// Unsaved source data for `client_id`
pub fn draft(
    client_id: i32,
    name: &str,
    relative_path: &str,
    data_type: &str,
    protocol: Protocol,
    status: SourceDataStatus,
) -> ActiveModel {
    ActiveModel {
        name: Set(name.to_string()),
        relative_path: Set(relative_path.to_string()),
        data_type: Set(data_type.to_string()),
        protocol: Set(protocol.into()),
        status: Set(status.into()),
        client_id: Set(client_id),
        ..Default::default()
    }
}

fn validate(active: &ActiveModel) -> crate::errors::Result<()> {
    if let Some(protocol) = current(&active.protocol) {
        protocol.parse::<Protocol>()?;
    }
    if let Some(status) = current(&active.status) {
        status.parse::<SourceDataStatus>()?;
    }
    Ok(())
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_delete = "Cascade"
    )]
    Client,

    #[sea_orm(has_many = "super::citation::Entity")]
    Citations,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::citation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Citations.def()
    }
}

impl Related<super::research_context::Entity> for Entity {
    fn to() -> RelationDef {
        super::source_data_research_context::Relation::ResearchContext.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::source_data_research_context::Relation::SourceData.def().rev())
    }
}

impl Related<super::agent_message::Entity> for Entity {
    fn to() -> RelationDef {
        super::citation::Relation::AgentMessage.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::citation::Relation::SourceData.def().rev())
    }
}

model_base!(soft, validate = validate);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::client;
    use crate::db::testing;
    use crate::errors::{AppError, ConstraintKind};
    use serde_json::json;
    use std::time::Duration;

    async fn new_client(session: &crate::db::Session, sub: &str) -> client::Model {
        client::ActiveModel {
            sub: Set(sub.to_string()),
            ..Default::default()
        }
        .save(true, Some(session))
        .await
        .unwrap()
        .unwrap()
    }

    #[tokio::test]
    async fn test_location_triple_is_unique() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();
        let owner = new_client(&session, "owner").await;
        let other = new_client(&session, "other").await;

        draft(owner.id, "paper", "docs/paper.pdf", "pdf", Protocol::S3, SourceDataStatus::Available)
            .save(true, Some(&session))
            .await
            .unwrap();

        let err = draft(owner.id, "copy", "docs/paper.pdf", "pdf", Protocol::S3, SourceDataStatus::Created)
            .save(true, Some(&session))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::ConstraintViolation { kind: ConstraintKind::Unique, .. }
        ));

        // Varying any one member of the triple is accepted
        draft(other.id, "paper", "docs/paper.pdf", "pdf", Protocol::S3, SourceDataStatus::Available)
            .save(true, Some(&session))
            .await
            .unwrap();
        draft(owner.id, "paper", "docs/paper-v2.pdf", "pdf", Protocol::S3, SourceDataStatus::Available)
            .save(true, Some(&session))
            .await
            .unwrap();
        draft(owner.id, "paper", "docs/paper.pdf", "pdf", Protocol::Local, SourceDataStatus::Available)
            .save(true, Some(&session))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_by_name_refreshes_updated_at() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();
        let owner = new_client(&session, "owner").await;
        let saved = draft(owner.id, "paper", "a.pdf", "pdf", Protocol::S3, SourceDataStatus::Created)
            .save(true, Some(&session))
            .await
            .unwrap()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;

        let fetched = Entity::find_by_id(saved.id)
            .one(session.conn())
            .await
            .unwrap()
            .unwrap();
        let previous = fetched.updated_at;
        fetched
            .update([("name", json!("x"))], false, Some(&session))
            .await
            .unwrap();
        session.flush().await.unwrap();

        let fresh = Entity::find_by_id(saved.id)
            .one(session.conn())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fresh.name, "x");
        assert!(fresh.updated_at > previous);
        assert_eq!(fresh.created_at, saved.created_at);
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_and_malformed_fields() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();
        let owner = new_client(&session, "owner").await;
        let saved = draft(owner.id, "paper", "a.pdf", "pdf", Protocol::S3, SourceDataStatus::Created)
            .save(true, Some(&session))
            .await
            .unwrap()
            .unwrap();

        let err = saved
            .clone()
            .update([("colour", json!("red"))], true, Some(&session))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownField { field, .. } if field == "colour"));

        let err = saved
            .clone()
            .update([("client_id", json!("not a number"))], true, Some(&session))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFieldValue { .. }));

        let err = saved
            .update([("protocol", json!("FTP"))], true, Some(&session))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFieldValue { .. }));
    }

    #[tokio::test]
    async fn test_type_column_keeps_its_stored_name() {
        let pool = testing::pool().await;
        let session = pool.begin().await.unwrap();
        let owner = new_client(&session, "owner").await;
        let mut saved = draft(owner.id, "paper", "a.pdf", "pdf", Protocol::Kernel, SourceDataStatus::Processing)
            .save(true, Some(&session))
            .await
            .unwrap()
            .unwrap();

        assert!(saved.keys().iter().any(|key| key == "type"));
        assert_eq!(saved.get("type").unwrap(), json!("pdf"));
        assert_eq!(saved.protocol().unwrap(), Protocol::Kernel);
        assert_eq!(saved.status().unwrap(), SourceDataStatus::Processing);

        saved.set("type", json!("txt")).unwrap();
        assert_eq!(saved.data_type, "txt");
    }
}
