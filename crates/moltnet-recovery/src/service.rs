//! Recovery protocol service (C10, spec §4.8).

use std::sync::Arc;

use chrono::Utc;
use rand::RngCore;

use moltnet_crypto::verify;
use moltnet_db::{AgentRepo, RecoveryNonceRepo};
use moltnet_types::recovery::{ParsedChallenge, RecoveryChallenge, RecoveryResult as RecoveryMaterials, RECOVERY_CHALLENGE_TTL_SECS};

use crate::admin_client::RecoveryAdminClient;
use crate::config::RecoveryConfig;
use crate::error::{RecoveryError, RecoveryResult};

pub struct RecoveryService {
    agents: AgentRepo,
    nonces: RecoveryNonceRepo,
    admin: Arc<dyn RecoveryAdminClient>,
    config: RecoveryConfig,
}

impl RecoveryService {
    pub fn new(agents: AgentRepo, nonces: RecoveryNonceRepo, admin: Arc<dyn RecoveryAdminClient>, config: RecoveryConfig) -> Self {
        Self { agents, nonces, admin, config }
    }

    /// Issue a challenge for `public_key`. 404s (via `AgentNotFound`) if
    /// no agent owns that key.
    pub async fn issue_challenge(&self, public_key: &str) -> RecoveryResult<RecoveryChallenge> {
        self.agents
            .find_by_public_key(public_key)
            .await?
            .ok_or(RecoveryError::AgentNotFound)?;

        let mut nonce_bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce_hex = hex::encode(nonce_bytes);
        let issued_at_millis = Utc::now().timestamp_millis();

        let challenge = ParsedChallenge::render(public_key, &nonce_hex, issued_at_millis);
        let hmac = moltnet_crypto::hmac_sha256(&challenge, &self.config.challenge_secret);

        Ok(RecoveryChallenge { challenge, hmac })
    }

    /// Verify a presented challenge/hmac/signature triple and, on
    /// success, mint a recovery code through the identity-admin API.
    /// Steps follow spec §4.8 in order; each failure maps to the code the
    /// spec names for it.
    pub async fn verify(
        &self,
        challenge: &str,
        hmac: &str,
        signature: &str,
        public_key: &str,
    ) -> RecoveryResult<RecoveryMaterials> {
        // 1. Parse into six colon-separated segments.
        let parsed = ParsedChallenge::parse(challenge)
            .ok_or_else(|| RecoveryError::InvalidChallenge("Malformed challenge".to_string()))?;

        // 2. The embedded key must match the presented one.
        if parsed.public_key != public_key {
            return Err(RecoveryError::InvalidChallenge(
                "Challenge was issued for a different key".to_string(),
            ));
        }

        // 3. Recompute HMAC in constant time.
        if !moltnet_crypto::verify_hmac(challenge, &self.config.challenge_secret, hmac) {
            return Err(RecoveryError::InvalidChallenge("Challenge HMAC mismatch".to_string()));
        }

        // 4. Timestamp window.
        let now_millis = Utc::now().timestamp_millis();
        if parsed.issued_at_millis > now_millis {
            return Err(RecoveryError::InvalidChallenge(
                "Challenge timestamp is in the future".to_string(),
            ));
        }
        let age_secs = (now_millis - parsed.issued_at_millis) / 1000;
        if age_secs > RECOVERY_CHALLENGE_TTL_SECS {
            return Err(RecoveryError::InvalidChallenge("Challenge expired".to_string()));
        }

        // 5. Atomically consume the nonce.
        match self.nonces.consume(&parsed.nonce_hex, public_key).await {
            Ok(()) => {}
            Err(moltnet_db::DbError::Duplicate(_)) => {
                return Err(RecoveryError::InvalidChallenge("Challenge already used".to_string()))
            }
            Err(other) => return Err(RecoveryError::Storage(other)),
        }

        // 6. Verify the Ed25519 signature over the raw challenge string.
        if !verify(challenge.as_bytes(), signature, public_key) {
            return Err(RecoveryError::InvalidSignature);
        }

        // 7. Resolve identity and mint a recovery code.
        let agent = self
            .agents
            .find_by_public_key(public_key)
            .await?
            .ok_or(RecoveryError::AgentNotFound)?;

        let (recovery_code, recovery_flow_url) = self
            .admin
            .mint_recovery_code(&agent.identity_id.to_string())
            .await?;

        Ok(RecoveryMaterials { recovery_code, recovery_flow_url })
    }
}
