//! Retrieval pipeline errors.

use thiserror::Error;

use crate::error::{ServiceError, StoreError};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// An external call failed in a stage with no fallback.
    #[error("{stage} failed: {source}")]
    Service {
        stage: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    pub fn service(stage: &'static str, source: ServiceError) -> Self {
        Self::Service { stage, source }
    }
}
