//! Embedding pipeline (§4.9): a process-wide singleton producing
//! L2-normalized 384-vectors, generalized from `danielmriley-aigent`'s
//! `MemoryManager::EmbedFn` (`Arc<dyn Fn(&str) -> Option<Vec<f32>> + Send +
//! Sync>`, lazily configured) into an async trait so a real model backend
//! can be swapped in without touching call sites.

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;

use moltnet_types::diary::EMBEDDING_DIM;

const PASSAGE_PREFIX: &str = "passage: ";
const QUERY_PREFIX: &str = "query: ";

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, text: &str) -> Option<Vec<f32>>;
}

/// Embed a diary entry's content for storage (§4.9 step 2).
pub async fn embed_passage(model: &dyn EmbeddingModel, content: &str) -> Option<Vec<f32>> {
    model.embed(&format!("{PASSAGE_PREFIX}{content}")).await
}

/// Embed a search query before hybrid ranking (§4.9 `search`).
pub async fn embed_query(model: &dyn EmbeddingModel, query: &str) -> Option<Vec<f32>> {
    model.embed(&format!("{QUERY_PREFIX}{query}")).await
}

/// Deterministic, dependency-free embedder: hashes overlapping 3-gram
/// windows of the input into fixed buckets of a 384-dim vector, then
/// L2-normalizes. Not semantically meaningful, but satisfies every
/// invariant a real model backend must (fixed dimension, normalized
/// length, zero-vector safe for empty input) so the rest of the pipeline
/// — storage, HNSW indexing, cosine ranking — is exercised end-to-end
/// without a network call to an inference service.
#[derive(Debug, Default)]
pub struct HashEmbedder;

#[async_trait]
impl EmbeddingModel for HashEmbedder {
    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        if text.trim().is_empty() {
            return Some(vec![0.0; EMBEDDING_DIM]);
        }

        let mut buckets = vec![0.0f32; EMBEDDING_DIM];
        let bytes = text.as_bytes();
        let window = 3usize;
        let mut any_gram = false;

        for start in 0..bytes.len() {
            let end = (start + window).min(bytes.len());
            if end - start < window && start > 0 {
                break;
            }
            any_gram = true;
            let mut hasher = Sha256::new();
            hasher.update(&bytes[start..end]);
            let digest = hasher.finalize();
            let bucket = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize % EMBEDDING_DIM;
            let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
            buckets[bucket] += sign;
        }

        if !any_gram {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            let digest = hasher.finalize();
            for (i, chunk) in digest.chunks(1).enumerate().take(EMBEDDING_DIM) {
                buckets[i] = chunk[0] as f32 - 128.0;
            }
        }

        Some(l2_normalize(buckets))
    }
}

/// L2-normalize, leaving an all-zero vector untouched (§8: "zero in ⇒ zero
/// out, no NaN").
fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

static EMBEDDING_MODEL: OnceCell<Arc<dyn EmbeddingModel>> = OnceCell::const_new();

/// Process-wide embedding model, loaded once on first use (§5: "The
/// embedding model is a process-wide singleton loaded lazily on first
/// use; subsequent calls reuse it").
pub async fn embedding_model() -> Arc<dyn EmbeddingModel> {
    EMBEDDING_MODEL
        .get_or_init(|| async { Arc::new(HashEmbedder) as Arc<dyn EmbeddingModel> })
        .await
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_input_yields_zero_vector() {
        let model = HashEmbedder;
        let v = model.embed("").await.unwrap();
        assert_eq!(v.len(), EMBEDDING_DIM);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn nonempty_input_is_unit_length() {
        let model = HashEmbedder;
        let v = model.embed("an autonomous agent's durable memory").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
        assert_eq!(v.len(), EMBEDDING_DIM);
    }

    #[tokio::test]
    async fn embedding_is_deterministic() {
        let model = HashEmbedder;
        let a = model.embed("repeatable content").await.unwrap();
        let b = model.embed("repeatable content").await.unwrap();
        assert_eq!(a, b);
    }
}
