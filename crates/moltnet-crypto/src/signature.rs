//! Signing and verification (§4.1 of the spec).

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{decode_public_key, KeyPair, ED25519_PREFIX};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{Signature as Ed25519Signature, Signer, Verifier};

/// Sign `message` and return the `ed25519:<base64>` wire form.
pub fn sign(message: &[u8], keypair: &KeyPair) -> String {
    let signature = keypair.signing_key().sign(message);
    encode_signature(&signature)
}

/// Verify a `ed25519:<base64>`-or-bare-base64 signature against `message`
/// and a public key in either wire form. Never panics on malformed input:
/// any parse failure is treated as verification failure.
pub fn verify(message: &[u8], signature: &str, public_key: &str) -> bool {
    let Ok(sig) = decode_signature(signature) else {
        return false;
    };
    let Ok(pk) = decode_public_key(public_key) else {
        return false;
    };
    pk.verify(message, &sig).is_ok()
}

/// Sign `message + "." + nonce` (§4.1, §4.7: nonce-bound signing requests).
pub fn sign_with_nonce(message: &str, nonce: &str, keypair: &KeyPair) -> String {
    sign(bind_nonce(message, nonce).as_bytes(), keypair)
}

/// Verify a signature over `message + "." + nonce`.
pub fn verify_with_nonce(message: &str, nonce: &str, signature: &str, public_key: &str) -> bool {
    verify(bind_nonce(message, nonce).as_bytes(), signature, public_key)
}

fn bind_nonce(message: &str, nonce: &str) -> String {
    format!("{message}.{nonce}")
}

fn encode_signature(signature: &Ed25519Signature) -> String {
    format!("{ED25519_PREFIX}{}", STANDARD.encode(signature.to_bytes()))
}

fn decode_signature(input: &str) -> CryptoResult<Ed25519Signature> {
    let stripped = input.strip_prefix(ED25519_PREFIX).unwrap_or(input);
    let bytes = STANDARD
        .decode(stripped)
        .map_err(|e| CryptoError::InvalidSignatureFormat(format!("invalid base64: {e}")))?;
    let array: [u8; 64] = bytes.as_slice().try_into().map_err(|_| {
        CryptoError::InvalidSignatureFormat(format!(
            "signature must be 64 bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(Ed25519Signature::from_bytes(&array))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let kp = KeyPair::generate();
        let msg = b"hello moltnet";
        let sig = sign(msg, &kp);
        assert!(verify(msg, &sig, &kp.public_key_string()));
    }

    #[test]
    fn flipped_message_bit_fails() {
        let kp = KeyPair::generate();
        let sig = sign(b"hello moltnet", &kp);
        assert!(!verify(b"hello moltnEt", &sig, &kp.public_key_string()));
    }

    #[test]
    fn flipped_signature_bit_fails() {
        let kp = KeyPair::generate();
        let msg = b"hello moltnet";
        let sig = sign(msg, &kp);
        let mut raw = STANDARD
            .decode(sig.strip_prefix(ED25519_PREFIX).unwrap())
            .unwrap();
        raw[0] ^= 0xFF;
        let tampered = format!("{ED25519_PREFIX}{}", STANDARD.encode(raw));
        assert!(!verify(msg, &tampered, &kp.public_key_string()));
    }

    #[test]
    fn nonce_binding_roundtrip() {
        let kp = KeyPair::generate();
        let sig = sign_with_nonce("Hello from e2e", "abc123", &kp);
        assert!(verify_with_nonce(
            "Hello from e2e",
            "abc123",
            &sig,
            &kp.public_key_string()
        ));
        assert!(!verify_with_nonce(
            "Hello from e2e",
            "different-nonce",
            &sig,
            &kp.public_key_string()
        ));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let sig = sign(b"hello", &kp1);
        assert!(!verify(b"hello", &sig, &kp2.public_key_string()));
    }
}
