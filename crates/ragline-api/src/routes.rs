//! HTTP route definitions.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the service router.
///
/// ## Route Structure
///
/// ```text
/// POST /chat    - Answer a query (streamed text fragments)
/// POST /ingest  - Add raw documents to the store
/// GET  /health  - Liveness and store statistics
/// ```
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat", post(handlers::chat))
        .route("/ingest", post(handlers::ingest))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
