//! # Ragline Provider: OpenAI
//!
//! [`LanguageModel`](ragline_protocols::LanguageModel) and
//! [`EmbeddingProvider`](ragline_protocols::EmbeddingProvider)
//! implementations for OpenAI-compatible HTTP APIs (OpenAI, Groq,
//! vLLM, ...), plus a deterministic offline hash embedding fallback.

mod api;
mod chat;
mod embeddings;
mod hash;

pub use chat::OpenAIChatModel;
pub use embeddings::OpenAIEmbeddings;
pub use hash::HashEmbedding;
