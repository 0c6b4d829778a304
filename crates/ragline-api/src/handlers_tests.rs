use super::*;

use std::collections::VecDeque;

use async_trait::async_trait;
use axum::Router;
use axum::body::to_bytes;
use axum::http::Request;
use parking_lot::Mutex;
use ragline_index::{Chunker, HybridStore};
use ragline_pipeline::{IngestionController, PipelineConfig, RetrievalPipeline};
use ragline_protocols::{
    Chunk, DistanceMetric, EmbeddedChunk, EmbeddingProvider, LanguageModel, Metadata,
    ServiceError,
};
use tower::ServiceExt;

use crate::routes::create_router;

struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, ServiceError>>>,
}

impl ScriptedModel {
    fn new(responses: Vec<Result<String, ServiceError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        match self.responses.lock().pop_front() {
            Some(response) => response,
            None => panic!("no scripted response left for prompt: {prompt}"),
        }
    }
}

struct FixedEmbedding;

#[async_trait]
impl EmbeddingProvider for FixedEmbedding {
    fn id(&self) -> &str {
        "fixed"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ServiceError> {
        Ok(vec![0.0, 1.0])
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ServiceError> {
        Ok(texts.iter().map(|_| vec![0.0, 1.0]).collect())
    }

    fn dimension(&self) -> usize {
        2
    }
}

/// App with a scripted language model, a seeded store, and a 5-char
/// streaming fragment size.
fn scripted_app(
    responses: Vec<Result<String, ServiceError>>,
    passages: &[&str],
) -> (Router, Arc<HybridStore>) {
    let store = Arc::new(HybridStore::new(DistanceMetric::L2));
    if !passages.is_empty() {
        let batch: Vec<EmbeddedChunk> = passages
            .iter()
            .enumerate()
            .map(|(id, text)| {
                EmbeddedChunk::new(Chunk::new(*text, Metadata::new()), vec![id as f32, 1.0])
            })
            .collect();
        store.append(batch).unwrap();
    }

    let embedding = Arc::new(FixedEmbedding);
    let pipeline = Arc::new(RetrievalPipeline::new(
        store.clone(),
        ScriptedModel::new(responses),
        embedding.clone(),
        PipelineConfig::default(),
    ));
    let chunker = Chunker::new(500, 50).unwrap();
    let ingestion = Arc::new(IngestionController::new(store.clone(), embedding, chunker));
    let state = Arc::new(AppState::new(pipeline, ingestion, store.clone(), 5));
    (create_router(state), store)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_chat_streams_answer_text() {
    let (app, _) = scripted_app(
        vec![
            Ok("rewritten".to_string()),
            Ok("The sky is blue.".to_string()),
            Ok("Yes".to_string()),
        ],
        &["The sky is blue."],
    );

    let response = app
        .oneshot(post_json("/chat", r#"{"query":"what color is the sky?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    // Fragment boundaries are invisible once the stream is collected.
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"The sky is blue.");
}

#[tokio::test]
async fn test_chat_failure_hides_error_detail() {
    let (app, _) = scripted_app(
        vec![
            Ok("rewritten".to_string()),
            Err(ServiceError::Api {
                status: 500,
                message: "upstream exploded".to_string(),
            }),
        ],
        &["a passage"],
    );

    let response = app
        .oneshot(post_json("/chat", r#"{"query":"q"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("retrieval failed"));
    assert!(!text.contains("upstream exploded"));
}

#[tokio::test]
async fn test_chat_malformed_body_is_client_error() {
    let (app, _) = scripted_app(vec![], &[]);

    let response = app.oneshot(post_json("/chat", "{}")).await.unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_ingest_reports_passage_count() {
    let (app, store) = scripted_app(vec![], &[]);

    let response = app
        .oneshot(post_json("/ingest", r#"{"documents":["short document"]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: IngestResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed.status, "success");
    assert_eq!(parsed.ingested_documents, 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_ingest_blank_batch_rejected() {
    let (app, store) = scripted_app(vec![], &[]);

    let response = app
        .oneshot(post_json("/ingest", r#"{"documents":["", "   "]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed.error, "No documents provided");
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_health_reports_store_size() {
    let (app, _) = scripted_app(vec![], &["a", "b"]);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed.status, HealthStatus::Healthy);
    assert_eq!(parsed.passages, 2);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _) = scripted_app(vec![], &[]);

    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_fragments_split_by_characters() {
    assert_eq!(fragments("abcdef", 3), vec!["abc", "def"]);
    assert_eq!(fragments("abc", 5), vec!["abc"]);
    assert_eq!(fragments("", 5), Vec::<String>::new());
    // Multi-byte characters never split.
    assert_eq!(fragments("héllo wörld", 4), vec!["héll", "o wö", "rld"]);
    // A zero size is clamped rather than looping forever.
    assert_eq!(fragments("x", 0), vec!["x"]);
}
