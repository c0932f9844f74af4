//! `POST /auth/register` (spec §4.6, §6).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "public_key must not be empty"))]
    pub public_key: String,
    #[validate(length(min = 1, message = "voucher_code must not be empty"))]
    pub voucher_code: String,
}

/// The spec's §6 selection lists `{identityId, fingerprint, publicKey,
/// sessionToken?}`; `clientId`/`clientSecret` are included too, since
/// they are the OAuth2 client-credentials pair the newly registered agent
/// needs to obtain a bearer token at `POST /oauth2/token` in the first
/// place, and `RegistrationOutput` (§4.6 step 5) mints exactly one pair
/// per agent that is never shown again.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub identity_id: String,
    pub fingerprint: String,
    pub public_key: String,
    pub client_id: String,
    pub client_secret: String,
}

impl From<moltnet_registration::RegistrationOutput> for RegisterResponse {
    fn from(out: moltnet_registration::RegistrationOutput) -> Self {
        Self {
            identity_id: out.identity_id,
            fingerprint: out.fingerprint,
            public_key: out.public_key,
            client_id: out.client_id,
            client_secret: out.client_secret,
        }
    }
}

/// `POST /oauth2/token` form body. Only `client_credentials` is accepted
/// (spec §6); every other grant type is rejected before the upstream proxy
/// call is made.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub grant_type: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}
