//! Registration orchestrator (C8, spec §4.6).

mod collaborators;
mod error;
mod service;

pub use collaborators::{
    CreatedIdentity, HttpIdentityProvider, HttpOAuthClientMinter, IdentityProvider, IdentityTraits,
    MintedOAuthClient, OAuthClientMetadata, OAuthClientMinter,
};
pub use error::{RegistrationError, RegistrationResult};
pub use service::{RegistrationOutput, RegistrationService, WORKFLOW_KIND};
