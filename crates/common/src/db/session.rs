//! Transactional unit of work threaded through every mutation primitive

use crate::errors::{AppError, Result};
use crate::metrics::FlushTimer;
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A write recorded by a non-flushing primitive, applied on the next flush.
#[async_trait]
pub(crate) trait PendingWrite: Send {
    fn table(&self) -> &str;

    async fn apply(self: Box<Self>, txn: &DatabaseTransaction) -> Result<()>;
}

#[derive(Default)]
struct Staged {
    writes: Vec<Box<dyn PendingWrite>>,
    /// Set once a flush fails; the transaction then holds a partial unit of work
    failure: Option<String>,
}

impl Staged {
    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(AppError::SessionAborted {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// One database transaction plus the writes staged on it.
///
/// Reads through [`Session::conn`] see flushed writes only. After a failed
/// flush the session only accepts [`Session::rollback`].
pub struct Session {
    txn: DatabaseTransaction,
    staged: Mutex<Staged>,
}

impl Session {
    pub async fn begin(conn: &DatabaseConnection) -> Result<Self> {
        let txn = conn.begin().await?;
        Ok(Self {
            txn,
            staged: Mutex::new(Staged::default()),
        })
    }

    /// The transaction, for queries inside this unit of work
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Number of writes waiting for the next flush
    pub async fn pending(&self) -> usize {
        self.staged.lock().await.writes.len()
    }

    /// Whether a flush failed and the session must be rolled back
    pub async fn is_aborted(&self) -> bool {
        self.staged.lock().await.failure.is_some()
    }

    pub(crate) async fn stage(&self, write: Box<dyn PendingWrite>) -> Result<()> {
        let mut staged = self.staged.lock().await;
        staged.check()?;
        crate::metrics::record_staged(write.table());
        staged.writes.push(write);
        Ok(())
    }

    /// Apply staged writes in the order they were staged.
    ///
    /// On failure the remaining writes are discarded, the error is returned and
    /// the session is aborted: later flushes and commit fail with
    /// [`AppError::SessionAborted`].
    pub async fn flush(&self) -> Result<()> {
        let mut staged = self.staged.lock().await;
        staged.check()?;

        let writes = std::mem::take(&mut staged.writes);
        if writes.is_empty() {
            return Ok(());
        }

        let timer = FlushTimer::start();
        let count = writes.len();
        for (applied, write) in writes.into_iter().enumerate() {
            let table = write.table().to_owned();
            if let Err(err) = write.apply(&self.txn).await {
                warn!(table = %table, applied, discarded = count - applied - 1, error = %err, "Flush failed, session aborted");
                staged.failure = Some(err.to_string());
                return Err(err);
            }
        }
        timer.finish();

        debug!(writes = count, "Session flushed");
        Ok(())
    }

    /// Flush staged writes and commit the transaction
    pub async fn commit(self) -> Result<()> {
        self.flush().await?;
        self.txn.commit().await?;
        Ok(())
    }

    /// Discard staged writes and roll the transaction back
    pub async fn rollback(self) -> Result<()> {
        let discarded = self.staged.lock().await.writes.len();
        if discarded > 0 {
            debug!(discarded, "Discarding staged writes");
        }
        self.txn.rollback().await?;
        Ok(())
    }
}
