//! Hybrid passage store.
//!
//! Owns the canonical passage table plus the derived lexical and
//! vector indexes behind a single-writer/multi-reader snapshot
//! protocol.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use ragline_protocols::{DistanceMetric, EmbeddedChunk, Passage, SearchCandidate, StoreError};
use tracing::{debug, error};

use crate::lexical::{self, LexicalIndex};
use crate::vector::VectorIndex;

/// Point-in-time view of the store. Immutable once published.
#[derive(Debug, Clone)]
struct Snapshot {
    passages: Vec<Arc<Passage>>,
    lexical: LexicalIndex,
    vector: VectorIndex,
}

/// Owner of the passage table and both derived indexes.
///
/// Readers clone the current snapshot handle under a momentary lock
/// and then compute lock-free against that view. A writer builds the
/// successor snapshot off to the side and publishes it in one swap, so
/// a search observes all of an append batch or none of it, and never
/// sees the table and indexes at different lengths.
pub struct HybridStore {
    snapshot: RwLock<Arc<Snapshot>>,
    /// Serializes writers. Readers never take it.
    writer: Mutex<()>,
    /// Latched on invariant violation; all further writes are refused.
    poisoned: AtomicBool,
}

impl HybridStore {
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot {
                passages: Vec::new(),
                lexical: LexicalIndex::new(),
                vector: VectorIndex::new(metric),
            })),
            writer: Mutex::new(()),
            poisoned: AtomicBool::new(false),
        }
    }

    fn current(&self) -> Arc<Snapshot> {
        let guard = self.snapshot.read();
        Arc::clone(&guard)
    }

    /// Number of passages in the table.
    pub fn len(&self) -> usize {
        self.current().passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedding dimensionality, fixed by the first appended batch.
    pub fn dimension(&self) -> Option<usize> {
        self.current().vector.dimension()
    }

    /// Look up a passage by id.
    pub fn passage(&self, id: usize) -> Option<Arc<Passage>> {
        self.current().passages.get(id).cloned()
    }

    /// Whether the store has latched a corruption and refuses writes.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::SeqCst)
    }

    /// Append a batch of embedded chunks as one atomic transaction.
    ///
    /// Ids are assigned sequentially from the current table length.
    /// The whole batch is rejected with `DimensionMismatch` when any
    /// embedding deviates from the store dimensionality; nothing is
    /// appended in that case. Returns the number of passages added.
    pub fn append(&self, batch: Vec<EmbeddedChunk>) -> Result<usize, StoreError> {
        if self.is_poisoned() {
            return Err(StoreError::Corruption(
                "store refuses writes until rebuilt".to_string(),
            ));
        }
        if batch.is_empty() {
            return Ok(0);
        }

        let _writer = self.writer.lock();
        let current = self.current();

        let expected = current
            .vector
            .dimension()
            .unwrap_or(batch[0].embedding.len());
        for chunk in &batch {
            if chunk.embedding.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: chunk.embedding.len(),
                });
            }
        }

        let mut next = Snapshot::clone(&current);
        let base = next.passages.len();
        let count = batch.len();

        next.lexical.append(batch.iter().map(|chunk| chunk.text.as_str()));
        let embeddings: Vec<Vec<f32>> = batch.iter().map(|c| c.embedding.clone()).collect();
        next.vector.append(&embeddings)?;
        for (offset, chunk) in batch.into_iter().enumerate() {
            let passage = Passage::new(base + offset, chunk.text, chunk.metadata)
                .with_embedding(chunk.embedding);
            next.passages.push(Arc::new(passage));
        }

        if next.passages.len() != next.lexical.len() || next.passages.len() != next.vector.len() {
            self.poisoned.store(true, Ordering::SeqCst);
            error!(
                passages = next.passages.len(),
                lexical = next.lexical.len(),
                vector = next.vector.len(),
                "index lengths diverged; store halted for writes"
            );
            return Err(StoreError::Corruption(format!(
                "table/index length mismatch: passages={}, lexical={}, vector={}",
                next.passages.len(),
                next.lexical.len(),
                next.vector.len()
            )));
        }

        *self.snapshot.write() = Arc::new(next);
        debug!(appended = count, total = base + count, "append published");
        Ok(count)
    }

    /// Merged lexical and vector search over one consistent snapshot.
    ///
    /// Takes the lexical top-k (BM25, descending score) and the vector
    /// top-k (ascending distance), both with ties broken by lower id,
    /// and returns the union: lexical hits first, then vector hits not
    /// already present. Downstream reranking re-orders by true
    /// relevance, so this order only preserves retrieval diversity.
    /// Result length ranges from k (full overlap) up to 2k (disjoint
    /// top-k sets).
    pub fn hybrid_search(
        &self,
        query_text: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<Arc<Passage>>, StoreError> {
        let snapshot = self.current();

        let tokens = lexical::tokenize(query_text);
        let mut lexical_hits: Vec<(usize, f32)> =
            snapshot.lexical.score(&tokens).into_iter().collect();
        lexical_hits.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        lexical_hits.truncate(k);

        let vector_hits = snapshot.vector.search(query_embedding, k)?;

        let mut merged: Vec<SearchCandidate> =
            Vec::with_capacity(lexical_hits.len() + vector_hits.len());
        for (id, score) in &lexical_hits {
            merged.push(SearchCandidate {
                passage_id: *id,
                lexical_score: Some(*score),
                vector_score: None,
            });
        }
        for (id, distance) in &vector_hits {
            match merged.iter_mut().find(|c| c.passage_id == *id) {
                Some(candidate) => candidate.vector_score = Some(*distance),
                None => merged.push(SearchCandidate {
                    passage_id: *id,
                    lexical_score: None,
                    vector_score: Some(*distance),
                }),
            }
        }

        debug!(
            lexical = lexical_hits.len(),
            vector = vector_hits.len(),
            merged = merged.len(),
            "hybrid search merged"
        );

        let mut results = Vec::with_capacity(merged.len());
        for candidate in &merged {
            let Some(passage) = snapshot.passages.get(candidate.passage_id) else {
                self.poisoned.store(true, Ordering::SeqCst);
                error!(
                    passage_id = candidate.passage_id,
                    "search produced an id outside the passage table"
                );
                return Err(StoreError::Corruption(format!(
                    "search produced unknown passage id {}",
                    candidate.passage_id
                )));
            };
            results.push(Arc::clone(passage));
        }
        Ok(results)
    }

    /// Persist the vector index to `path`.
    ///
    /// The lexical index is never persisted; it is rebuilt from
    /// passage text at startup.
    pub fn save_vectors(&self, path: &Path) -> Result<(), StoreError> {
        self.current().vector.save(path)
    }
}
