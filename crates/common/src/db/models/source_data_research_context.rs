//! Association between research contexts and the source data they draw on

use crate::db::Session;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "source_data_research_context_association")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub source_data_id: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub research_context_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::source_data::Entity",
        from = "Column::SourceDataId",
        to = "super::source_data::Column::Id",
        on_delete = "Cascade"
    )]
    SourceData,

    #[sea_orm(
        belongs_to = "super::research_context::Entity",
        from = "Column::ResearchContextId",
        to = "super::research_context::Column::Id",
        on_delete = "Cascade"
    )]
    ResearchContext,
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn link(session: &Session, source_data_id: i32, research_context_id: i32) -> crate::errors::Result<()> {
    session.flush().await?;
    ActiveModel {
        source_data_id: Set(source_data_id),
        research_context_id: Set(research_context_id),
    }
    .insert(session.conn())
    .await?;
    Ok(())
}

pub async fn unlink(session: &Session, source_data_id: i32, research_context_id: i32) -> crate::errors::Result<bool> {
    session.flush().await?;
    let result = Entity::delete_by_id((source_data_id, research_context_id))
        .exec(session.conn())
        .await?;
    Ok(result.rows_affected > 0)
}
