//! Shared application state: every domain service `Arc`-wrapped behind
//! one struct the router hands to each handler.

use std::sync::Arc;

use moltnet_auth::TokenValidator;
use moltnet_db::{AgentRepo, Database};
use moltnet_diary::DiaryService;
use moltnet_recovery::RecoveryService;
use moltnet_registration::RegistrationService;
use moltnet_sharing::SharingService;
use moltnet_signing::SigningService;
use moltnet_voucher::VoucherService;

pub struct AppState {
    pub db: Arc<Database>,
    pub agents: AgentRepo,
    pub auth: TokenValidator,
    pub voucher: VoucherService,
    pub registration: RegistrationService,
    pub signing: SigningService,
    pub recovery: RecoveryService,
    pub diary: DiaryService,
    pub sharing: SharingService,
    pub oauth2: OAuth2ProxyState,
}

/// Reverse-proxy target for `POST /oauth2/token` (spec §6): MoltNet never
/// issues tokens itself, it forwards the `client_credentials` grant to the
/// upstream authorization server's public endpoint.
#[derive(Clone)]
pub struct OAuth2ProxyState {
    pub http: reqwest::Client,
    pub token_url: String,
}
