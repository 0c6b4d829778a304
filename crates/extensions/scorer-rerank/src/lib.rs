//! Cross-encoder reranking over an HTTP rerank endpoint.
//!
//! Speaks the request shape used by hosted rerank APIs (Jina, Cohere,
//! and compatible self-hosted servers): the query and candidate texts
//! go out in one request and come back as per-document relevance
//! scores.

mod api;
mod scorer;

pub use scorer::RerankScorer;
