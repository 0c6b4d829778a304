//! External service call errors (LLM, embedding, relevance scorer).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
