//! Retrieval-domain types shared between the store and the pipeline.

use serde::{Deserialize, Serialize};

/// Distance metric used by the vector index, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared Euclidean distance. Lower is closer.
    #[default]
    L2,
    /// Cosine distance (1 - cosine similarity). Lower is closer.
    Cosine,
}

/// Per-passage scores collected during hybrid search, before the
/// union merge resolves candidates back to passages.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCandidate {
    pub passage_id: usize,
    /// BM25 score when the passage ranked in the lexical top-k.
    pub lexical_score: Option<f32>,
    /// Distance when the passage ranked in the vector top-k.
    pub vector_score: Option<f32>,
}

/// Final pipeline output for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text returned to the caller.
    pub text: String,
    /// Whether validation judged the synthesized answer grounded in
    /// the retrieved context.
    pub supported: bool,
}

impl Answer {
    pub fn supported(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            supported: true,
        }
    }

    /// The canonical refusal returned when validation rejects the
    /// synthesized answer or the context is insufficient.
    pub fn unknown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            supported: false,
        }
    }
}
