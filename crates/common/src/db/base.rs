//! Mutation primitives shared by every persisted entity
//!
//! Each entity module invokes [`model_base!`] with `hard` (rows are physically
//! deleted) or `soft` (rows are flagged deleted and kept). The macro generates
//! the entity's timestamp stamping and its `save` / `delete` / `update` and
//! field access methods, all of which delegate to the generic functions here.
//!
//! Every mutation takes the session explicitly and fails with
//! [`AppError::NoSession`] without one.

use crate::db::session::{PendingWrite, Session};
use crate::errors::{AppError, Result};
use crate::metrics::record_write;
use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseTransaction, DbErr,
    EntityTrait, IdenStatic, IntoActiveModel, Iterable, PrimaryKeyToColumn, QueryFilter, Select,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// The plain model type behind an active model
pub type ModelOf<A> = <<A as ActiveModelTrait>::Entity as EntityTrait>::Model;

/// Validation run on an active model before it is written
pub type Validator<A> = fn(&A) -> Result<()>;

/// Timestamps carried by every audited row
pub trait Audited {
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
}

/// Deletion state carried by soft-deletable rows
pub trait SoftDeleted: Audited {
    fn is_deleted(&self) -> bool;
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
}

/// Entities whose rows carry a `deleted` flag
pub trait SoftDeletable: EntityTrait {
    fn deleted_column() -> Self::Column;
}

/// Which rows a read should return.
///
/// Soft-deleted rows are never hidden implicitly; every read states its choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only rows whose `deleted` flag is false
    Live,
    /// Every row, deleted or not
    All,
}

impl Visibility {
    pub fn apply<E: SoftDeletable>(self, select: Select<E>) -> Select<E> {
        match self {
            Visibility::Live => select.filter(E::deleted_column().eq(false)),
            Visibility::All => select,
        }
    }
}

pub fn require<'s>(session: Option<&'s Session>, operation: &'static str) -> Result<&'s Session> {
    session.ok_or(AppError::NoSession { operation })
}

/// The value an active model will write or already holds
pub fn current<T>(value: &ActiveValue<T>) -> Option<&T>
where
    T: Into<sea_orm::Value>,
{
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v),
        ActiveValue::NotSet => None,
    }
}

/// Validator for entities without write-time checks
pub fn no_validation<A>(_: &A) -> Result<()> {
    Ok(())
}

/// Next `updated_at` value, strictly after the one the row already has.
///
/// Truncated to microseconds so the value survives every backend unchanged.
pub fn next_timestamp(previous: &ActiveValue<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    match previous {
        ActiveValue::Set(prev) | ActiveValue::Unchanged(prev) if now <= *prev => {
            *prev + Duration::microseconds(1)
        }
        _ => now,
    }
}

/// Deletion timestamp, never earlier than the row's creation
pub fn deletion_time(created_at: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6).max(created_at)
}

pub fn table_name<E: EntityTrait>() -> String {
    E::default().table_name().to_owned()
}

/// Column names of an entity, in declaration order
pub fn field_names<E: EntityTrait>() -> Vec<String> {
    E::Column::iter().map(|column| column.as_str().to_owned()).collect()
}

pub fn column_named<E: EntityTrait>(name: &str) -> Result<E::Column> {
    E::Column::iter()
        .find(|column| column.as_str() == name)
        .ok_or_else(|| AppError::UnknownField {
            entity: table_name::<E>(),
            field: name.to_owned(),
        })
}

/// Column named `name`, refusing primary key columns.
///
/// A changed key would address a different row on the next update.
pub fn writable_column<E: EntityTrait>(name: &str) -> Result<E::Column> {
    let column = column_named::<E>(name)?;
    if E::PrimaryKey::from_column(column).is_some() {
        return Err(AppError::InvalidFieldValue {
            entity: table_name::<E>(),
            message: format!("primary key column {name} cannot be changed"),
        });
    }
    Ok(column)
}

/// Plain column-name to value mapping of a model
pub fn to_dict<E: EntityTrait, M: Serialize>(model: &M) -> Result<Map<String, Value>> {
    match serde_json::to_value(model)? {
        Value::Object(fields) => Ok(fields),
        other => Err(AppError::InvalidFieldValue {
            entity: table_name::<E>(),
            message: format!("model serialized to {other} instead of an object"),
        }),
    }
}

fn from_dict<E: EntityTrait, M: DeserializeOwned>(fields: Map<String, Value>) -> Result<M> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| AppError::InvalidFieldValue {
        entity: table_name::<E>(),
        message: e.to_string(),
    })
}

pub fn get_field<E: EntityTrait, M: Serialize>(model: &M, name: &str) -> Result<Value> {
    let column = column_named::<E>(name)?;
    Ok(to_dict::<E, M>(model)?
        .remove(column.as_str())
        .unwrap_or(Value::Null))
}

pub fn set_field<E, M>(model: &mut M, name: &str, value: Value) -> Result<()>
where
    E: EntityTrait,
    M: Serialize + DeserializeOwned,
{
    let column = writable_column::<E>(name)?;
    let mut fields = to_dict::<E, M>(model)?;
    fields.insert(column.as_str().to_owned(), value);
    *model = from_dict::<E, M>(fields)?;
    Ok(())
}

/// Values in column order
pub fn field_values<E: EntityTrait, M: Serialize>(model: &M) -> Result<Vec<Value>> {
    Ok(field_items::<E, M>(model)?
        .into_iter()
        .map(|(_, value)| value)
        .collect())
}

/// (column, value) pairs in column order
pub fn field_items<E: EntityTrait, M: Serialize>(model: &M) -> Result<Vec<(String, Value)>> {
    let mut fields = to_dict::<E, M>(model)?;
    Ok(field_names::<E>()
        .into_iter()
        .map(|name| {
            let value = fields.remove(&name).unwrap_or(Value::Null);
            (name, value)
        })
        .collect())
}

/// Mark every column of a loaded model as changed, for a full-row write
pub fn mark_all_set<A: ActiveModelTrait>(mut active: A) -> A {
    for column in <A::Entity as EntityTrait>::Column::iter() {
        active.reset(column);
    }
    active
}

fn is_new<A: ActiveModelTrait>(active: &A) -> bool {
    <A::Entity as EntityTrait>::PrimaryKey::iter()
        .any(|key| active.get(key.into_column()).is_not_set())
}

async fn write<A>(active: A, txn: &DatabaseTransaction) -> Result<ModelOf<A>>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
    ModelOf<A>: IntoActiveModel<A>,
{
    let table = table_name::<A::Entity>();

    if is_new(&active) {
        let model = active.insert(txn).await?;
        record_write(&table, "insert");
        debug!(table = %table, "Inserted row");
        return Ok(model);
    }

    match active.update(txn).await {
        Ok(model) => {
            record_write(&table, "update");
            debug!(table = %table, "Updated row");
            Ok(model)
        }
        Err(DbErr::RecordNotUpdated) => Err(AppError::StaleRecord { table }),
        Err(e) => Err(e.into()),
    }
}

async fn remove<A>(active: A, txn: &DatabaseTransaction) -> Result<()>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
{
    let table = table_name::<A::Entity>();
    let result = active.delete(txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::StaleRecord { table });
    }

    record_write(&table, "delete");
    debug!(table = %table, "Deleted row");
    Ok(())
}

struct Upsert<A> {
    table: String,
    active: A,
}

#[async_trait]
impl<A> PendingWrite for Upsert<A>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
    ModelOf<A>: IntoActiveModel<A>,
{
    fn table(&self) -> &str {
        &self.table
    }

    async fn apply(self: Box<Self>, txn: &DatabaseTransaction) -> Result<()> {
        let Upsert { active, .. } = *self;
        write(active, txn).await.map(|_| ())
    }
}

struct Removal<A> {
    table: String,
    active: A,
}

#[async_trait]
impl<A> PendingWrite for Removal<A>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
{
    fn table(&self) -> &str {
        &self.table
    }

    async fn apply(self: Box<Self>, txn: &DatabaseTransaction) -> Result<()> {
        let Removal { active, .. } = *self;
        remove(active, txn).await
    }
}

/// Insert (primary key not set) or update (primary key set) a row.
///
/// With `flush` the session's staged writes go first, then this one, and the
/// stored row is returned. Without it the write is staged and `None` returned.
pub async fn save_active<A>(
    active: A,
    flush: bool,
    session: Option<&Session>,
) -> Result<Option<ModelOf<A>>>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
    ModelOf<A>: IntoActiveModel<A>,
{
    let session = require(session, "save")?;

    if !flush {
        let table = table_name::<A::Entity>();
        session.stage(Box::new(Upsert { table, active })).await?;
        return Ok(None);
    }

    session.flush().await?;
    write(active, session.conn()).await.map(Some)
}

/// Physically delete a row
pub async fn remove_active<A>(active: A, flush: bool, session: Option<&Session>) -> Result<()>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
{
    let session = require(session, "delete")?;

    if !flush {
        let table = table_name::<A::Entity>();
        session.stage(Box::new(Removal { table, active })).await?;
        return Ok(());
    }

    session.flush().await?;
    remove(active, session.conn()).await
}

/// Apply `values` by column name onto `model`, then save it.
///
/// Only the named columns (and `updated_at`) are written.
pub async fn update_model<A, I, K>(
    model: ModelOf<A>,
    values: I,
    flush: bool,
    session: Option<&Session>,
    validate: Validator<A>,
) -> Result<Option<ModelOf<A>>>
where
    A: ActiveModelTrait + ActiveModelBehavior + From<ModelOf<A>> + Send + 'static,
    ModelOf<A>: IntoActiveModel<A> + Serialize + DeserializeOwned,
    I: IntoIterator<Item = (K, Value)>,
    K: AsRef<str>,
{
    let session = require(session, "update")?;

    let mut fields = to_dict::<A::Entity, _>(&model)?;
    let mut touched = Vec::new();
    for (name, value) in values {
        let column = writable_column::<A::Entity>(name.as_ref())?;
        fields.insert(column.as_str().to_owned(), value);
        touched.push(column);
    }

    let mut active = A::from(from_dict::<A::Entity, ModelOf<A>>(fields)?);
    for column in touched {
        active.reset(column);
    }
    validate(&active)?;

    save_active(active, flush, Some(session)).await
}

/// Generates an entity's timestamp stamping and mutation methods.
///
/// `model_base!(hard)` deletes rows physically; `model_base!(soft)` flags
/// them. An optional `validate = path` runs before every write.
macro_rules! model_base {
    (hard $(, validate = $validate:path)?) => {
        $crate::db::base::model_base!(@audited $($validate)?);

        #[::async_trait::async_trait]
        impl ::sea_orm::ActiveModelBehavior for ActiveModel {
            async fn before_save<C>(mut self, _db: &C, insert: bool) -> ::std::result::Result<Self, ::sea_orm::DbErr>
            where
                C: ::sea_orm::ConnectionTrait,
            {
                let now = $crate::db::base::next_timestamp(&self.updated_at);
                if insert && self.created_at.is_not_set() {
                    self.created_at = ::sea_orm::ActiveValue::Set(now);
                }
                self.updated_at = ::sea_orm::ActiveValue::Set(now);
                Ok(self)
            }
        }

        impl Model {
            /// Physically remove this row
            pub async fn delete(
                self,
                flush: bool,
                session: Option<&$crate::db::Session>,
            ) -> $crate::errors::Result<()> {
                $crate::db::base::remove_active(ActiveModel::from(self), flush, session).await
            }
        }
    };

    (soft $(, validate = $validate:path)?) => {
        $crate::db::base::model_base!(@audited $($validate)?);

        #[::async_trait::async_trait]
        impl ::sea_orm::ActiveModelBehavior for ActiveModel {
            async fn before_save<C>(mut self, _db: &C, insert: bool) -> ::std::result::Result<Self, ::sea_orm::DbErr>
            where
                C: ::sea_orm::ConnectionTrait,
            {
                let now = $crate::db::base::next_timestamp(&self.updated_at);
                if insert {
                    if self.created_at.is_not_set() {
                        self.created_at = ::sea_orm::ActiveValue::Set(now);
                    }
                    if self.deleted.is_not_set() {
                        self.deleted = ::sea_orm::ActiveValue::Set(false);
                    }
                }
                self.updated_at = ::sea_orm::ActiveValue::Set(now);
                Ok(self)
            }
        }

        impl $crate::db::base::SoftDeletable for Entity {
            fn deleted_column() -> Column {
                Column::Deleted
            }
        }

        impl $crate::db::base::SoftDeleted for Model {
            fn is_deleted(&self) -> bool {
                self.deleted
            }

            fn deleted_at(&self) -> Option<::chrono::DateTime<::chrono::Utc>> {
                self.deleted_at
            }
        }

        impl Model {
            /// Flag this row deleted and write it through the save path; the row is kept
            pub async fn delete(
                self,
                flush: bool,
                session: Option<&$crate::db::Session>,
            ) -> $crate::errors::Result<Option<Model>> {
                let session = $crate::db::base::require(session, "delete")?;
                let deleted_at = $crate::db::base::deletion_time(self.created_at);
                let mut active = ActiveModel::from(self);
                active.deleted = ::sea_orm::ActiveValue::Set(true);
                active.deleted_at = ::sea_orm::ActiveValue::Set(Some(deleted_at));
                $crate::db::base::save_active(active, flush, Some(session)).await
            }

            /// Physically remove this row; foreign keys declared with cascade follow
            pub async fn purge(
                self,
                flush: bool,
                session: Option<&$crate::db::Session>,
            ) -> $crate::errors::Result<()> {
                $crate::db::base::remove_active(ActiveModel::from(self), flush, session).await
            }
        }
    };

    (@audited) => {
        $crate::db::base::model_base!(@audited $crate::db::base::no_validation);
    };

    (@audited $validate:path) => {
        impl $crate::db::base::Audited for Model {
            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.updated_at
            }
        }

        impl ActiveModel {
            /// Insert this record, or update it when its primary key is set
            pub async fn save(
                self,
                flush: bool,
                session: Option<&$crate::db::Session>,
            ) -> $crate::errors::Result<Option<Model>> {
                $validate(&self)?;
                $crate::db::base::save_active(self, flush, session).await
            }
        }

        impl Model {
            /// Write every column of this row
            pub async fn save(
                self,
                flush: bool,
                session: Option<&$crate::db::Session>,
            ) -> $crate::errors::Result<Option<Model>> {
                let active = $crate::db::base::mark_all_set(ActiveModel::from(self));
                $validate(&active)?;
                $crate::db::base::save_active(active, flush, session).await
            }

            /// Apply column-name to value pairs, then save
            pub async fn update<I, K>(
                self,
                values: I,
                flush: bool,
                session: Option<&$crate::db::Session>,
            ) -> $crate::errors::Result<Option<Model>>
            where
                I: IntoIterator<Item = (K, ::serde_json::Value)>,
                K: AsRef<str>,
            {
                $crate::db::base::update_model::<ActiveModel, I, K>(self, values, flush, session, $validate)
                    .await
            }

            pub fn get(&self, field: &str) -> $crate::errors::Result<::serde_json::Value> {
                $crate::db::base::get_field::<Entity, Self>(self, field)
            }

            pub fn set(&mut self, field: &str, value: ::serde_json::Value) -> $crate::errors::Result<()> {
                $crate::db::base::set_field::<Entity, Self>(self, field, value)
            }

            pub fn keys(&self) -> Vec<String> {
                $crate::db::base::field_names::<Entity>()
            }

            pub fn values(&self) -> $crate::errors::Result<Vec<::serde_json::Value>> {
                $crate::db::base::field_values::<Entity, Self>(self)
            }

            pub fn items(&self) -> $crate::errors::Result<Vec<(String, ::serde_json::Value)>> {
                $crate::db::base::field_items::<Entity, Self>(self)
            }

            pub fn to_dict(&self) -> $crate::errors::Result<::serde_json::Map<String, ::serde_json::Value>> {
                $crate::db::base::to_dict::<Entity, Self>(self)
            }
        }
    };
}

pub(crate) use model_base;
