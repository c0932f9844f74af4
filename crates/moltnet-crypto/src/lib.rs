//! Cryptographic primitives for MoltNet: Ed25519 keys and signatures,
//! key fingerprints, and HMAC challenge authentication.
//!
//! Organized as a `keys`/`signature`/`hash` module split, adapted to
//! MoltNet's agent-identity use case (nonce-bound signing, fingerprint
//! derivation, HMAC recovery challenges).

mod error;
mod fingerprint;
mod hmac_util;
mod keys;
mod signature;

pub use error::{CryptoError, CryptoResult};
pub use fingerprint::fingerprint;
pub use hmac_util::{hmac_sha256, verify_hmac};
pub use keys::{decode_public_key, decode_public_key_bytes, encode_public_key, KeyPair, ED25519_PREFIX};
pub use signature::{sign, sign_with_nonce, verify, verify_with_nonce};
