//! Key generation and the `ed25519:<base64>` public-key wire format.

use crate::error::{CryptoError, CryptoResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;

/// Wire prefix for every serialized public key and signature.
pub const ED25519_PREFIX: &str = "ed25519:";

/// A generated agent keypair. The signing key never leaves this struct;
/// only `public_key_string()` is meant to cross a process boundary.
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new random Ed25519 keypair.
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    pub fn from_signing_key_bytes(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// The raw 32-byte public key.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// The `ed25519:<base64>` wire form of the public key.
    pub fn public_key_string(&self) -> String {
        encode_public_key(&self.public_key_bytes())
    }
}

/// Serialize raw public-key bytes as `ed25519:<base64>`.
pub fn encode_public_key(raw: &[u8; 32]) -> String {
    format!("{ED25519_PREFIX}{}", STANDARD.encode(raw))
}

/// Parse a public key string, accepting either the prefixed
/// (`ed25519:<base64>`) or bare base64 form (spec §4.1: "All public-key
/// string inputs accept `ed25519:<base64>` or bare base64").
pub fn decode_public_key(input: &str) -> CryptoResult<VerifyingKey> {
    let raw = decode_public_key_bytes(input)?;
    VerifyingKey::from_bytes(&raw)
        .map_err(|e| CryptoError::InvalidKeyFormat(format!("invalid Ed25519 point: {e}")))
}

/// Parse a public key string into its raw 32 bytes, without validating
/// that the bytes form a point on the curve. Used by fingerprint
/// derivation, which operates on raw bytes regardless of point validity.
pub fn decode_public_key_bytes(input: &str) -> CryptoResult<[u8; 32]> {
    let stripped = input.strip_prefix(ED25519_PREFIX).unwrap_or(input);
    let bytes = STANDARD
        .decode(stripped)
        .map_err(|e| CryptoError::InvalidKeyFormat(format!("invalid base64: {e}")))?;
    if bytes.len() != 32 {
        return Err(CryptoError::InvalidKeyFormat(format!(
            "public key must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_prefixed_and_bare_forms() {
        let kp = KeyPair::generate();
        let prefixed = kp.public_key_string();
        let bare = prefixed.strip_prefix(ED25519_PREFIX).unwrap();

        assert_eq!(decode_public_key(&prefixed).unwrap(), *kp.verifying_key());
        assert_eq!(decode_public_key(bare).unwrap(), *kp.verifying_key());
    }

    #[test]
    fn rejects_wrong_length() {
        let short = STANDARD.encode([0u8; 16]);
        assert!(decode_public_key(&short).is_err());
    }
}
