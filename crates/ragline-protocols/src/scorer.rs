//! Relevance scoring protocol.

use async_trait::async_trait;

use crate::error::ServiceError;

/// Trait for pairwise query/passage relevance backends.
///
/// Used by the retrieval pipeline to rerank hybrid search candidates.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// Identifier for logging and diagnostics.
    fn id(&self) -> &str;

    /// Score every passage against the query.
    ///
    /// Returns one score per passage, in input order. Higher means
    /// more relevant.
    async fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, ServiceError>;
}
