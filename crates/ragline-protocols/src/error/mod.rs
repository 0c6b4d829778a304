//! Error types for the ragline protocol layer.

mod ingest;
mod pipeline;
mod service;
mod store;

pub use ingest::*;
pub use pipeline::*;
pub use service::*;
pub use store::*;
