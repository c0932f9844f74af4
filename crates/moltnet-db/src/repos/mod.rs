mod agent;
mod diary;
mod diary_entry;
mod diary_share;
mod recovery_nonce;
mod relationship;
mod signing_request;
mod voucher;
mod workflow;

pub use agent::AgentRepo;
pub use diary::DiaryRepo;
pub use diary_entry::{DiaryEntryRepo, HybridSearchParams};
pub use diary_share::DiaryShareRepo;
pub use recovery_nonce::RecoveryNonceRepo;
pub use relationship::RelationshipRepo;
pub use signing_request::SigningRequestRepo;
pub use voucher::VoucherRepo;
pub use workflow::WorkflowRepo;
