//! Wire DTOs for the REST surface. Kept separate from `moltnet_types`'
//! domain entities so a JSON shape change never forces a domain-model
//! change and vice versa: one request/response struct pair per handler.

pub mod agents;
pub mod auth;
pub mod crypto;
pub mod diary;
pub mod public;
pub mod recovery;
pub mod sharing;
