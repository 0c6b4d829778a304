//! # Ragline Pipeline
//!
//! Request-level flows for the ragline retrieval service.
//!
//! ## Components
//!
//! - [`RetrievalPipeline`] - answers one query: rewrite, retrieve,
//!   rerank, select context, synthesize, validate
//! - [`IngestionController`] - turns raw text batches into embedded
//!   passages and applies them to the store atomically
//!
//! Both flows hold the store and the external services behind `Arc`
//! handles and keep no per-request state, so one instance serves any
//! number of concurrent requests.

pub mod ingest;
pub mod pipeline;

pub use ingest::IngestionController;
pub use pipeline::{PipelineConfig, RetrievalPipeline, UNKNOWN_ANSWER};
