//! # Ragline API
//!
//! HTTP interface for the ragline retrieval service.
//!
//! ## Endpoints
//!
//! - `POST /chat` - answer a query, streamed as fixed-size text
//!   fragments
//! - `POST /ingest` - add raw documents to the store
//! - `GET /health` - liveness and store statistics
//!
//! The server owns no retrieval logic: handlers delegate to the
//! pipeline and ingestion flows held in [`AppState`].

pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use handlers::{ChatRequest, IngestRequest, IngestResponse};
pub use routes::create_router;
pub use server::{ApiConfig, ApiServer};
pub use state::AppState;
