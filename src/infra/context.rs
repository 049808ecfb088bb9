//! Persistence context.
//!
//! Holds the connection plus the writes staged by repositories. Nothing
//! reaches the database until [`DbContext::save_changes`], which applies
//! every staged write, in staging order, inside one transaction.

use futures::future::BoxFuture;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tokio::sync::Mutex;

use crate::errors::{AppError, AppResult};

type PendingChange =
    Box<dyn for<'t> FnOnce(&'t DatabaseTransaction) -> BoxFuture<'t, Result<(), DbErr>> + Send>;

/// Per-request database context.
pub struct DbContext {
    db: DatabaseConnection,
    pending: Mutex<Vec<PendingChange>>,
}

impl DbContext {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Queue a write for the next [`save_changes`](Self::save_changes).
    pub async fn stage<F>(&self, change: F)
    where
        F: for<'t> FnOnce(&'t DatabaseTransaction) -> BoxFuture<'t, Result<(), DbErr>>
            + Send
            + 'static,
    {
        self.pending.lock().await.push(Box::new(change));
    }

    pub async fn has_changes(&self) -> bool {
        !self.pending.lock().await.is_empty()
    }

    /// Drop every staged write. Returns how many were dropped.
    pub async fn discard_changes(&self) -> usize {
        let mut pending = self.pending.lock().await;
        let dropped = pending.len();
        pending.clear();
        dropped
    }

    /// Commit all staged writes atomically. Returns how many were applied.
    ///
    /// The queue is emptied either way; on failure the transaction is
    /// rolled back and the error returned unchanged.
    pub async fn save_changes(&self) -> AppResult<usize> {
        let changes = std::mem::take(&mut *self.pending.lock().await);
        if changes.is_empty() {
            return Ok(0);
        }

        let count = changes.len();
        let txn = self.db.begin().await.map_err(AppError::from)?;

        for change in changes {
            if let Err(e) = change(&txn).await {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                return Err(e.into());
            }
        }

        txn.commit().await.map_err(AppError::from)?;
        tracing::debug!(changes = count, "Saved staged changes");
        Ok(count)
    }
}
