//! Diary service (C9, spec §4.9): embedding pipeline, injection-risk
//! scanning, hybrid vector+lexical search, and reflection digests, sitting
//! on top of `moltnet-db`'s diary/entry repos and the `C4` permission
//! adapter.

mod embedding;
mod error;
mod injection;
mod service;

pub use embedding::{embed_passage, embed_query, embedding_model, EmbeddingModel, HashEmbedder};
pub use error::{DiaryError, DiaryResult};
pub use injection::scan as scan_injection_risk;
pub use service::{DiaryService, NewEntry};
