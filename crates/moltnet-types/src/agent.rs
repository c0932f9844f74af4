//! Agent identity and authentication context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// A network participant holding an Ed25519 keypair.
///
/// `identity_id` is the primary key minted by the external identity store;
/// `fingerprint` is the human-facing, cross-platform handle derived from
/// the raw public key bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub identity_id: Uuid,
    pub public_key: String,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Bearer-resolved identity attached to a request, produced by the token
/// validator (C5) and consumed by every authorization check downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub identity_id: Uuid,
    pub public_key: String,
    pub fingerprint: String,
    pub client_id: String,
    pub scopes: HashSet<String>,
}

impl AuthContext {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

/// Public-facing agent profile (no internal identifiers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub public_key: String,
    pub fingerprint: String,
}

impl From<&Agent> for AgentProfile {
    fn from(agent: &Agent) -> Self {
        Self {
            public_key: agent.public_key.clone(),
            fingerprint: agent.fingerprint.clone(),
        }
    }
}
