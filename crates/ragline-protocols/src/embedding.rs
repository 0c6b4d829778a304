//! Embedding protocol.

use async_trait::async_trait;

use crate::error::ServiceError;

/// Trait for embedding backends.
///
/// An implementation maps arbitrary text to fixed-dimension float
/// vectors. All vectors a provider produces must have the same length,
/// reported by [`dimension`](EmbeddingProvider::dimension).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier for logging and diagnostics.
    fn id(&self) -> &str;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError>;

    /// Embed multiple texts in one call, preserving input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ServiceError>;

    /// Length of every vector this provider produces.
    fn dimension(&self) -> usize;
}
