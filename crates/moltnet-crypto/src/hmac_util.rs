//! HMAC-SHA256 helper used by the recovery challenge protocol (§4.8).

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute `hex(HMAC-SHA256(secret, data))`.
pub fn hmac_sha256(data: &str, secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison of a computed HMAC against one received over
/// the wire, so timing does not leak how many leading hex digits matched.
pub fn verify_hmac(data: &str, secret: &[u8], candidate_hex: &str) -> bool {
    let expected = hmac_sha256(data, secret);
    expected.as_bytes().ct_eq(candidate_hex.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_matching_hmac() {
        let mac = hmac_sha256("payload", b"secret");
        assert!(verify_hmac("payload", b"secret", &mac));
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let mac = hmac_sha256("payload", b"secret");
        assert!(!verify_hmac("payload-tampered", b"secret", &mac));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let mac = hmac_sha256("payload", b"secret");
        assert!(!verify_hmac("payload", b"other-secret", &mac));
    }
}
