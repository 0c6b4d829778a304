//! Batch ingestion into the hybrid store.

use std::sync::Arc;
use std::time::Instant;

use ragline_index::{Chunker, HybridStore};
use ragline_protocols::{
    Document, EmbeddedChunk, EmbeddingProvider, IngestError, ServiceError,
};
use tracing::info;

/// Turns raw text batches into embedded passages and applies them to
/// the store as one atomic append.
pub struct IngestionController {
    store: Arc<HybridStore>,
    embedding: Arc<dyn EmbeddingProvider>,
    chunker: Chunker,
}

impl IngestionController {
    pub fn new(
        store: Arc<HybridStore>,
        embedding: Arc<dyn EmbeddingProvider>,
        chunker: Chunker,
    ) -> Self {
        Self {
            store,
            embedding,
            chunker,
        }
    }

    /// Ingest a batch of raw texts.
    ///
    /// Texts that are blank after trimming are dropped; a batch with
    /// nothing left fails with [`IngestError::EmptyBatch`]. The whole
    /// batch is embedded in one call and appended in one transaction,
    /// so a concurrent search observes either none or all of it.
    /// Returns the number of passages added.
    pub async fn ingest(&self, texts: &[String]) -> Result<usize, IngestError> {
        let start = Instant::now();

        let documents: Vec<Document> = texts
            .iter()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .map(|text| Document::new(text).with_metadata("source", "api"))
            .collect();
        if documents.is_empty() {
            return Err(IngestError::EmptyBatch);
        }

        let mut chunks = Vec::new();
        for document in &documents {
            chunks.extend(self.chunker.split(document));
        }

        let chunk_texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self
            .embedding
            .embed_batch(&chunk_texts)
            .await
            .map_err(IngestError::Embedding)?;
        if embeddings.len() != chunks.len() {
            return Err(IngestError::Embedding(ServiceError::InvalidResponse(
                format!(
                    "expected {} embeddings, got {}",
                    chunks.len(),
                    embeddings.len()
                ),
            )));
        }

        let batch: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk::new(chunk, embedding))
            .collect();

        let appended = self.store.append(batch)?;
        info!(
            documents = documents.len(),
            passages = appended,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ingest applied"
        );
        Ok(appended)
    }
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
