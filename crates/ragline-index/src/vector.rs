//! Flat nearest-neighbor index over passage embeddings.

use std::fs;
use std::path::Path;

use ragline_protocols::{DistanceMetric, StoreError};
use serde::{Deserialize, Serialize};

const PERSIST_VERSION: u32 = 1;

/// Exact brute-force nearest-neighbor index.
///
/// Vectors are identified by position: the first appended vector
/// belongs to passage 0. Dimensionality is fixed by the first vector;
/// every later append must match it.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    metric: DistanceMetric,
    dimension: Option<usize>,
    vectors: Vec<Vec<f32>>,
}

/// On-disk form of [`VectorIndex`].
#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    version: u32,
    metric: DistanceMetric,
    dimension: Option<usize>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            dimension: None,
            vectors: Vec::new(),
        }
    }

    /// Build an index from an initial set of embeddings.
    pub fn build(metric: DistanceMetric, embeddings: &[Vec<f32>]) -> Result<Self, StoreError> {
        let mut index = Self::new(metric);
        index.append(embeddings)?;
        Ok(index)
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Dimensionality, once fixed by the first appended vector.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Append embeddings. The whole batch is rejected when any vector
    /// deviates from the index dimensionality; on error the index is
    /// unchanged.
    pub fn append(&mut self, embeddings: &[Vec<f32>]) -> Result<(), StoreError> {
        if embeddings.is_empty() {
            return Ok(());
        }
        let expected = self.dimension.unwrap_or(embeddings[0].len());
        if expected == 0 {
            return Err(StoreError::InvalidConfig(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        for embedding in embeddings {
            if embedding.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }
        self.dimension = Some(expected);
        self.vectors.extend(embeddings.iter().cloned());
        Ok(())
    }

    /// Nearest neighbors by ascending distance, ties broken by lower
    /// id. `k` larger than the index size returns all entries.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, StoreError> {
        let Some(expected) = self.dimension else {
            return Ok(Vec::new());
        };
        if query.len() != expected {
            return Err(StoreError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }

        let mut hits: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(id, vector)| (id, self.distance(query, vector)))
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        hits.truncate(k);
        Ok(hits)
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            DistanceMetric::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
        }
    }

    /// Serialize the index to `path`, creating parent directories as
    /// needed.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let persisted = PersistedIndex {
            version: PERSIST_VERSION,
            metric: self.metric,
            dimension: self.dimension,
            vectors: self.vectors.clone(),
        };
        fs::write(path, serde_json::to_vec(&persisted)?)?;
        Ok(())
    }

    /// Load an index previously written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let bytes = fs::read(path)?;
        let persisted: PersistedIndex = serde_json::from_slice(&bytes)?;
        if persisted.version != PERSIST_VERSION {
            return Err(StoreError::Corruption(format!(
                "unsupported vector index version {}",
                persisted.version
            )));
        }
        match persisted.dimension {
            Some(expected) => {
                if persisted.vectors.iter().any(|v| v.len() != expected) {
                    return Err(StoreError::Corruption(
                        "vector lengths do not match the recorded dimension".to_string(),
                    ));
                }
            }
            None => {
                if !persisted.vectors.is_empty() {
                    return Err(StoreError::Corruption(
                        "vectors present without a recorded dimension".to_string(),
                    ));
                }
            }
        }
        Ok(Self {
            metric: persisted.metric,
            dimension: persisted.dimension,
            vectors: persisted.vectors,
        })
    }
}

/// Cosine similarity between two equal-length vectors. Zero when
/// either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
