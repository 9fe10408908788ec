// Embedder trait — the capability boundary for text embeddings.
//
// The pipeline only needs the contract "text in, vector out, cosine
// similarity approximates topical similarity". The default implementation
// runs all-MiniLM-L6-v2 locally via ONNX; a deterministic hashing
// vectorizer serves as the model-free fallback, and tests inject stubs.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for embedding review texts into fixed-dimension dense vectors.
///
/// Implementations must be deterministic per text, return exactly one
/// vector per input text, and error rather than silently return zeros.
/// Async because a backend may sit behind inference or an HTTP service.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per text, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;

    /// The dimension of vectors this embedder produces.
    fn dimension(&self) -> usize;
}
