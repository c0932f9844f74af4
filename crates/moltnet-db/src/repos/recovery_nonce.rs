//! Recovery nonce ledger (§4.8): durable replay protection for the
//! cryptographic recovery challenge protocol.

use sqlx::PgPool;

use crate::error::{DbError, DbResult};

#[derive(Clone)]
pub struct RecoveryNonceRepo {
    pool: PgPool,
}

impl RecoveryNonceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a nonce as consumed. A primary-key conflict means the nonce
    /// was already used and the caller must reject the recovery attempt
    /// as a replay.
    pub async fn consume(&self, nonce_hex: &str, public_key: &str) -> DbResult<()> {
        let result = sqlx::query(
            "INSERT INTO used_recovery_nonces (nonce_hex, public_key) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(nonce_hex)
        .bind(public_key)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::Duplicate(format!("nonce {nonce_hex} already used")));
        }
        Ok(())
    }

    pub async fn is_used(&self, nonce_hex: &str) -> DbResult<bool> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM used_recovery_nonces WHERE nonce_hex = $1)")
                .bind(nonce_hex)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    /// Drop nonce records older than the challenge TTL window multiplied
    /// several times over, so the table doesn't grow unbounded. Safe to
    /// run on a schedule since expired challenges can never be replayed
    /// anyway (the timestamp embedded in the challenge itself is checked
    /// independently of this table).
    pub async fn prune_older_than(&self, retention: chrono::Duration) -> DbResult<u64> {
        let cutoff = chrono::Utc::now() - retention;
        let result = sqlx::query("DELETE FROM used_recovery_nonces WHERE used_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
