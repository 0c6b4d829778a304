//! Deterministic offline embedding fallback.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use ragline_protocols::{EmbeddingProvider, ServiceError};

/// Hash-based embedding (not semantic).
///
/// Maps each whitespace token to a pseudo-random direction derived
/// from its hash and sums them into a unit vector. Deterministic for
/// a given input, which keeps persisted vector indexes loadable across
/// restarts. Intended for tests and offline operation; retrieval
/// quality with it is purely lexical.
pub struct HashEmbedding {
    dimension: usize,
}

impl HashEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let mut state = hasher.finish();

            for slot in vector.iter_mut() {
                // xorshift keeps drawing well-spread values from the
                // word hash.
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                *slot += (state & 0xFFFF) as f32 / 65535.0 - 0.5;
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    fn id(&self) -> &str {
        "hash"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ServiceError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
