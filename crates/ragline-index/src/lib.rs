//! # Ragline Index
//!
//! The hybrid retrieval core: a sliding-window chunker, a BM25 lexical
//! index, a flat nearest-neighbor vector index, and the [`HybridStore`]
//! that owns all three behind a single-writer/multi-reader snapshot
//! protocol.

pub mod chunker;
pub mod lexical;
pub mod store;
pub mod vector;

pub use chunker::Chunker;
pub use lexical::LexicalIndex;
pub use store::HybridStore;
pub use vector::VectorIndex;
