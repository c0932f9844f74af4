use thiserror::Error;
use moltnet_types::error::MoltNetError;

#[derive(Debug, Error)]
pub enum VoucherError {
    #[error("issuer already has the maximum of {0} active vouchers")]
    CapReached(i64),

    #[error("another issuance for this issuer won the race; retry")]
    Contention,

    #[error("voucher not found, expired, or already redeemed")]
    InvalidOrRedeemed,

    #[error("storage error: {0}")]
    Storage(#[from] moltnet_db::DbError),
}

pub type VoucherResult<T> = Result<T, VoucherError>;

impl From<VoucherError> for MoltNetError {
    fn from(e: VoucherError) -> Self {
        match e {
            VoucherError::CapReached(_) | VoucherError::InvalidOrRedeemed => {
                MoltNetError::Forbidden(e.to_string())
            }
            VoucherError::Contention => MoltNetError::internal(e.to_string()),
            VoucherError::Storage(db) => db.into(),
        }
    }
}
