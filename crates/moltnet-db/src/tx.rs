//! `TransactionRunner` (§5): a thin wrapper around `PgPool::begin` used
//! wherever an orchestrator needs several repository calls to commit or
//! roll back together — registration's "redeem voucher, upsert agent row"
//! step is the canonical example.

use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};

use crate::error::DbResult;

#[derive(Clone)]
pub struct TransactionRunner {
    pool: PgPool,
}

impl TransactionRunner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run `f` against a single connection inside a transaction, committing
    /// on `Ok` and rolling back on `Err`.
    pub async fn run<F, T>(&self, f: F) -> DbResult<T>
    where
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, DbResult<T>> + Send,
        T: Send,
    {
        let mut tx = self.pool.begin().await?;
        let result = f(&mut tx).await;
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                tx.rollback().await.ok();
                Err(err)
            }
        }
    }
}
