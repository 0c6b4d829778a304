//! Language model protocol.

use async_trait::async_trait;

use crate::error::ServiceError;

/// Trait for chat completion backends.
///
/// Implementations receive a fully rendered prompt and return the raw
/// model text. Prompt construction stays with the caller.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier for logging and diagnostics.
    fn id(&self) -> &str;

    /// Complete a single prompt.
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}
