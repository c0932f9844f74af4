//! Voucher lifecycle (§4.5): issuance capped at 5 active vouchers per
//! issuer under SERIALIZABLE isolation, and single-atomic-UPDATE
//! redemption so exactly one concurrent redeemer wins.

use rand::RngCore;
use uuid::Uuid;

use moltnet_db::{DbError, VoucherRepo};
use moltnet_types::voucher::{Voucher, VOUCHER_MAX_ACTIVE_PER_ISSUER};

use crate::error::{VoucherError, VoucherResult};

pub struct VoucherService {
    repo: VoucherRepo,
}

impl VoucherService {
    pub fn new(repo: VoucherRepo) -> Self {
        Self { repo }
    }

    /// Issue a voucher for `issuer_id`. Returns `VoucherError::CapReached`
    /// if the issuer already has 5 active vouchers, or
    /// `VoucherError::Contention` if a concurrent issuance for the same
    /// issuer won a SERIALIZABLE race first — the caller may retry.
    pub async fn issue(&self, issuer_id: Uuid) -> VoucherResult<Voucher> {
        let code = generate_code();
        match self.repo.issue(issuer_id, &code).await {
            Ok(v) => Ok(v.into()),
            Err(DbError::CapacityExceeded(_)) => Err(VoucherError::CapReached(VOUCHER_MAX_ACTIVE_PER_ISSUER)),
            Err(DbError::Query(sqlx::Error::Database(ref db_err))) if db_err.code().as_deref() == Some("40001") => {
                Err(VoucherError::Contention)
            }
            Err(other) => Err(VoucherError::Storage(other)),
        }
    }

    /// Redeem a voucher code. Exactly one concurrent caller for the same
    /// code observes `Ok`; every other caller (including a retry of the
    /// same request after the first succeeded) observes
    /// `VoucherError::InvalidOrRedeemed`.
    pub async fn redeem(&self, code: &str, redeemer_id: Uuid) -> VoucherResult<Voucher> {
        match self.repo.redeem(code, redeemer_id).await {
            Ok(v) => Ok(v.into()),
            Err(DbError::InvalidInput(_)) => Err(VoucherError::InvalidOrRedeemed),
            Err(other) => Err(VoucherError::Storage(other)),
        }
    }

    pub async fn list_active_for_issuer(&self, issuer_id: Uuid) -> VoucherResult<Vec<Voucher>> {
        Ok(self
            .repo
            .list_active_for_issuer(issuer_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}

/// A 64-char hex voucher code: 32 random bytes from the OS CSPRNG.
fn generate_code() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_64_hex_chars_and_unique() {
        let a = generate_code();
        let b = generate_code();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
