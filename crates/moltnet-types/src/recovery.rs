//! Recovery protocol wire types (§4.8 of the spec).

use serde::{Deserialize, Serialize};

/// Challenge validity window.
pub const RECOVERY_CHALLENGE_TTL_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryChallenge {
    pub challenge: String,
    pub hmac: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryVerifyRequest {
    pub challenge: String,
    pub hmac: String,
    pub signature: String,
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecoveryResult {
    pub recovery_code: String,
    pub recovery_flow_url: String,
}

/// The six colon-separated segments of a parsed challenge string:
/// `moltnet:recovery:<public_key>:<nonce_hex>:<unix_millis>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChallenge {
    pub public_key: String,
    pub nonce_hex: String,
    pub issued_at_millis: i64,
}

impl ParsedChallenge {
    pub const PREFIX: &'static str = "moltnet";
    pub const KIND: &'static str = "recovery";

    /// Splits into exactly six colon-separated segments: the public key
    /// itself carries one colon (`ed25519:<base64>`), so
    /// `moltnet:recovery:<pk-alg>:<pk-b64>:<nonce>:<ts>` is the well-formed
    /// shape, per spec §4.8 step 1.
    pub fn parse(challenge: &str) -> Option<Self> {
        let parts: Vec<&str> = challenge.split(':').collect();
        if parts.len() != 6 {
            return None;
        }
        if parts[0] != Self::PREFIX || parts[1] != Self::KIND {
            return None;
        }
        let issued_at_millis: i64 = parts[5].parse().ok()?;
        Some(Self {
            public_key: format!("{}:{}", parts[2], parts[3]),
            nonce_hex: parts[4].to_string(),
            issued_at_millis,
        })
    }

    /// `public_key` is expected in `ed25519:<base64>` form so the rendered
    /// challenge splits into six segments.
    pub fn render(public_key: &str, nonce_hex: &str, issued_at_millis: i64) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            Self::PREFIX,
            Self::KIND,
            public_key,
            nonce_hex,
            issued_at_millis
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_challenge() {
        let s = ParsedChallenge::render("ed25519:AAAA", "deadbeef", 1_700_000_000_000);
        let parsed = ParsedChallenge::parse(&s).unwrap();
        assert_eq!(parsed.public_key, "ed25519:AAAA");
        assert_eq!(parsed.nonce_hex, "deadbeef");
        assert_eq!(parsed.issued_at_millis, 1_700_000_000_000);
    }

    #[test]
    fn rejects_malformed_challenge() {
        assert!(ParsedChallenge::parse("not:a:challenge").is_none());
        assert!(ParsedChallenge::parse("moltnet:other:pk:nonce:123").is_none());
        assert!(ParsedChallenge::parse("moltnet:recovery:pk:nonce:notanumber").is_none());
    }
}
