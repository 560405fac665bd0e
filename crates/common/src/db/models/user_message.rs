//! Variant table for messages written by a user

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_message")]
pub struct Model {
    /// Same id as the `message_base` row
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::message_base::Entity",
        from = "Column::Id",
        to = "super::message_base::Column::Id",
        on_delete = "Cascade"
    )]
    MessageBase,
}

impl Related<super::message_base::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MessageBase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
