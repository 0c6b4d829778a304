//! Passage types flowing through the hybrid store.

use serde::{Deserialize, Serialize};

use crate::document::Metadata;

/// A window of document text produced by the chunker, not yet embedded
/// or assigned a store id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// A chunk paired with its embedding, ready for a store append.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub text: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

impl EmbeddedChunk {
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            text: chunk.text,
            metadata: chunk.metadata,
            embedding,
        }
    }
}

/// An indexed passage owned by the hybrid store's passage table.
///
/// The id equals the passage's position at insertion time and is never
/// reused. Passages are immutable once created: the table only grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: usize,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Dense embedding, present for every passage created through
    /// ingestion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Passage {
    pub fn new(id: usize, text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id,
            text: text.into(),
            metadata,
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}
