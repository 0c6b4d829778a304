//! Request handlers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Json, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use ragline_protocols::IngestError;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::state::AppState;

/// Request to answer a query.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

/// Request to ingest raw documents.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub documents: Vec<String>,
}

/// Response from a successful ingest.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub status: String,
    /// Number of passages added to the store.
    pub ingested_documents: usize,
}

/// Error body returned on request failures.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Serving normally.
    Healthy,
    /// Reads still served, writes refused after a detected corruption.
    Degraded,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub passages: usize,
    pub requests: u64,
}

/// Answer a query, streaming the answer text back as fixed-size
/// fragments.
///
/// POST /chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Response {
    let request_id = Uuid::new_v4();
    state.record_request();
    info!(%request_id, query_chars = req.query.chars().count(), "chat request");

    match state.pipeline.answer(&req.query).await {
        Ok(answer) => {
            let stream = futures::stream::iter(
                fragments(&answer.text, state.fragment_size)
                    .into_iter()
                    .map(|fragment| Ok::<_, Infallible>(Bytes::from(fragment))),
            );
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(stream),
            )
                .into_response()
        }
        Err(err) => {
            // Callers get a generic failure; the cause stays in the log.
            error!(%request_id, error = %err, "chat request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "retrieval failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Ingest raw documents into the store.
///
/// POST /ingest
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestRequest>,
) -> Response {
    let request_id = Uuid::new_v4();
    state.record_request();
    info!(%request_id, documents = req.documents.len(), "ingest request");

    match state.ingestion.ingest(&req.documents).await {
        Ok(count) => (
            StatusCode::OK,
            Json(IngestResponse {
                status: "success".to_string(),
                ingested_documents: count,
            }),
        )
            .into_response(),
        Err(IngestError::EmptyBatch) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: IngestError::EmptyBatch.to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            error!(%request_id, error = %err, "ingest request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "ingestion failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Liveness and store statistics.
///
/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = if state.store.is_poisoned() {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };
    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        passages: state.store.len(),
        requests: state.request_count(),
    })
}

/// Split `text` into fragments of `size` characters; the last may be
/// shorter. Counting characters keeps a boundary from landing inside
/// a multi-byte code point.
fn fragments(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
