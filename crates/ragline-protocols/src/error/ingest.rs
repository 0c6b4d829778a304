//! Ingestion errors.

use thiserror::Error;

use crate::error::{ServiceError, StoreError};

#[derive(Debug, Error)]
pub enum IngestError {
    /// The batch contained no non-empty text after trimming.
    #[error("No documents provided")]
    EmptyBatch,

    #[error("Embedding failed: {0}")]
    Embedding(#[source] ServiceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
