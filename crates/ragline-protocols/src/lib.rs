//! # Ragline Protocols
//!
//! Shared type and trait definitions for the ragline retrieval service.
//! Contains only data types and interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`LanguageModel`] - Trait for chat completion backends
//! - [`EmbeddingProvider`] - Trait for text embedding backends
//! - [`RelevanceScorer`] - Trait for pairwise query/passage scoring backends

pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod passage;
pub mod retrieval;
pub mod scorer;

// Re-export core types and traits
pub use document::{Document, Metadata};
pub use embedding::EmbeddingProvider;
pub use error::{IngestError, PipelineError, ServiceError, StoreError};
pub use llm::LanguageModel;
pub use passage::{Chunk, EmbeddedChunk, Passage};
pub use retrieval::{Answer, DistanceMetric, SearchCandidate};
pub use scorer::RelevanceScorer;
