//! Human-readable key fingerprints (§4.1).

use sha2::{Digest, Sha256};

/// Derive the `XXXX-XXXX-XXXX-XXXX` fingerprint of a raw 32-byte public key:
/// the first 8 bytes of SHA-256 over the raw key, rendered as uppercase hex
/// and hyphenated every 4 characters.
pub fn fingerprint(raw_public_key: &[u8; 32]) -> String {
    let digest = Sha256::digest(raw_public_key);
    let hex = hex::encode_upper(&digest[..8]);
    hex.as_bytes()
        .chunks(4)
        .map(|chunk| std::str::from_utf8(chunk).expect("hex chunk is valid utf8"))
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_expected_shape() {
        let fp = fingerprint(&[0u8; 32]);
        let parts: Vec<&str> = fp.split('-').collect();
        assert_eq!(parts.len(), 4);
        for part in parts {
            assert_eq!(part.len(), 4);
            assert!(part.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn is_deterministic() {
        let key = [7u8; 32];
        assert_eq!(fingerprint(&key), fingerprint(&key));
    }

    #[test]
    fn differs_for_different_keys() {
        assert_ne!(fingerprint(&[1u8; 32]), fingerprint(&[2u8; 32]));
    }
}
