//! Voucher repository: SERIALIZABLE issuance capping active vouchers per
//! issuer, and atomic single-winner redemption (§4.2).

use chrono::{Duration, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use moltnet_types::voucher::{VOUCHER_MAX_ACTIVE_PER_ISSUER, VOUCHER_TTL_HOURS};

use crate::error::{DbError, DbResult};
use crate::models::DbVoucher;

#[derive(Clone)]
pub struct VoucherRepo {
    pool: PgPool,
}

impl VoucherRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Issue a voucher, enforcing the per-issuer active-voucher cap under
    /// SERIALIZABLE isolation so concurrent issuers can never race past
    /// the limit (spec: "at most 5 active vouchers per issuer at once").
    pub async fn issue(&self, issuer_id: Uuid, code: &str) -> DbResult<DbVoucher> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        let active: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM vouchers
            WHERE issuer_id = $1 AND redeemed_at IS NULL AND expires_at > NOW()
            "#,
        )
        .bind(issuer_id)
        .fetch_one(&mut *tx)
        .await?;

        if active.0 >= VOUCHER_MAX_ACTIVE_PER_ISSUER {
            return Err(DbError::CapacityExceeded(format!(
                "issuer already has {} active vouchers",
                active.0
            )));
        }

        let expires_at = Utc::now() + Duration::hours(VOUCHER_TTL_HOURS);
        let voucher = sqlx::query_as::<_, DbVoucher>(
            r#"
            INSERT INTO vouchers (code, issuer_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, code, issuer_id, redeemed_by, expires_at, redeemed_at, created_at
            "#,
        )
        .bind(code)
        .bind(issuer_id)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("vouchers_code_key") {
                    return DbError::Duplicate("voucher code collision".to_string());
                }
            }
            DbError::Query(e)
        })?;

        tx.commit().await?;
        Ok(voucher)
    }

    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<DbVoucher>> {
        sqlx::query_as::<_, DbVoucher>(
            "SELECT id, code, issuer_id, redeemed_by, expires_at, redeemed_at, created_at FROM vouchers WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)
    }

    /// Atomically redeem a voucher: a single `UPDATE ... WHERE redeemed_by
    /// IS NULL` guarantees exactly one caller wins a race on the same code
    /// without an explicit row lock.
    pub async fn redeem(&self, code: &str, redeemed_by: Uuid) -> DbResult<DbVoucher> {
        sqlx::query_as::<_, DbVoucher>(
            r#"
            UPDATE vouchers
            SET redeemed_by = $2, redeemed_at = NOW()
            WHERE code = $1 AND redeemed_by IS NULL AND expires_at > NOW()
            RETURNING id, code, issuer_id, redeemed_by, expires_at, redeemed_at, created_at
            "#,
        )
        .bind(code)
        .bind(redeemed_by)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::InvalidInput("voucher not found, expired, or already redeemed".to_string()))
    }

    /// Same atomic redemption as `redeem`, but against a caller-supplied
    /// connection so it composes into a larger transaction (registration's
    /// "redeem voucher, upsert agent row" step via `TransactionRunner`).
    pub async fn redeem_in_tx(&self, conn: &mut PgConnection, code: &str, redeemed_by: Uuid) -> DbResult<DbVoucher> {
        sqlx::query_as::<_, DbVoucher>(
            r#"
            UPDATE vouchers
            SET redeemed_by = $2, redeemed_at = NOW()
            WHERE code = $1 AND redeemed_by IS NULL AND expires_at > NOW()
            RETURNING id, code, issuer_id, redeemed_by, expires_at, redeemed_at, created_at
            "#,
        )
        .bind(code)
        .bind(redeemed_by)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::InvalidInput("voucher not found, expired, or already redeemed".to_string()))
    }

    pub async fn list_active_for_issuer(&self, issuer_id: Uuid) -> DbResult<Vec<DbVoucher>> {
        sqlx::query_as::<_, DbVoucher>(
            r#"
            SELECT id, code, issuer_id, redeemed_by, expires_at, redeemed_at, created_at
            FROM vouchers
            WHERE issuer_id = $1 AND redeemed_at IS NULL AND expires_at > NOW()
            ORDER BY created_at DESC
            "#,
        )
        .bind(issuer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)
    }
}
