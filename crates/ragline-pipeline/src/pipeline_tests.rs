use super::*;

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use ragline_protocols::{Chunk, DistanceMetric, EmbeddedChunk, Metadata};

/// Replays scripted completions in order and records every prompt.
struct StubLanguageModel {
    responses: Mutex<VecDeque<Result<String, ServiceError>>>,
    prompts: Mutex<Vec<String>>,
}

impl StubLanguageModel {
    fn new(responses: Vec<Result<String, ServiceError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LanguageModel for StubLanguageModel {
    fn id(&self) -> &str {
        "stub-llm"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        self.prompts.lock().push(prompt.to_string());
        match self.responses.lock().pop_front() {
            Some(response) => response,
            None => panic!("no scripted response left for prompt: {prompt}"),
        }
    }
}

/// Returns a fixed query vector and records embedded texts.
struct StubEmbedding {
    vector: Vec<f32>,
    texts: Mutex<Vec<String>>,
}

impl StubEmbedding {
    fn new(vector: Vec<f32>) -> Arc<Self> {
        Arc::new(Self {
            vector,
            texts: Mutex::new(Vec::new()),
        })
    }

    fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedding {
    fn id(&self) -> &str {
        "stub-embedding"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        self.texts.lock().push(text.to_string());
        Ok(self.vector.clone())
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ServiceError> {
        Ok(texts.iter().map(|_| self.vector.clone()).collect())
    }

    fn dimension(&self) -> usize {
        self.vector.len()
    }
}

struct StubScorer {
    scores: Vec<f32>,
    fail: bool,
}

impl StubScorer {
    fn with_scores(scores: Vec<f32>) -> Arc<Self> {
        Arc::new(Self {
            scores,
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            scores: Vec::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl RelevanceScorer for StubScorer {
    fn id(&self) -> &str {
        "stub-scorer"
    }

    async fn score(&self, _query: &str, _passages: &[&str]) -> Result<Vec<f32>, ServiceError> {
        if self.fail {
            return Err(ServiceError::Network("connection refused".to_string()));
        }
        Ok(self.scores.clone())
    }
}

/// Store with one passage per text, embedded at `[id, 1.0]` so vector
/// order follows insertion order for a `[0.0, 1.0]` query.
fn seeded_store(texts: &[&str]) -> Arc<HybridStore> {
    let store = HybridStore::new(DistanceMetric::L2);
    let batch: Vec<EmbeddedChunk> = texts
        .iter()
        .enumerate()
        .map(|(id, text)| EmbeddedChunk::new(Chunk::new(*text, Metadata::new()), vec![id as f32, 1.0]))
        .collect();
    store.append(batch).unwrap();
    Arc::new(store)
}

fn query_vector() -> Vec<f32> {
    vec![0.0, 1.0]
}

#[tokio::test]
async fn test_answer_happy_path() {
    let store = seeded_store(&["The sky is blue.", "Grass is green."]);
    let llm = StubLanguageModel::new(vec![
        Ok("What color is the sky?".to_string()),
        Ok("Blue.".to_string()),
        Ok("Yes".to_string()),
    ]);
    let embedding = StubEmbedding::new(query_vector());
    let pipeline = RetrievalPipeline::new(
        store,
        llm.clone(),
        embedding,
        PipelineConfig::default(),
    );

    let answer = pipeline.answer("sky color?").await.unwrap();
    assert_eq!(answer.text, "Blue.");
    assert!(answer.supported);

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].starts_with("Rewrite the question clearly:"));
    // Synthesis sees the retrieved context and the original question,
    // not the rewritten one.
    assert!(prompts[1].contains("The sky is blue."));
    assert!(prompts[1].contains("Question:\nsky color?"));
    assert!(prompts[2].starts_with("Is the answer fully supported"));
    assert!(prompts[2].contains("Blue."));
}

#[tokio::test]
async fn test_validation_rejection_returns_unknown() {
    let store = seeded_store(&["The sky is blue."]);
    let llm = StubLanguageModel::new(vec![
        Ok("What color is the grass?".to_string()),
        Ok("Green.".to_string()),
        Ok("No, not supported".to_string()),
    ]);
    let embedding = StubEmbedding::new(query_vector());
    let pipeline = RetrievalPipeline::new(
        store,
        llm,
        embedding,
        PipelineConfig::default(),
    );

    let answer = pipeline.answer("What color is the grass?").await.unwrap();
    assert_eq!(answer.text, UNKNOWN_ANSWER);
    assert!(!answer.supported);
}

#[tokio::test]
async fn test_rewrite_failure_falls_back_to_raw_query() {
    let store = seeded_store(&["Some passage."]);
    let llm = StubLanguageModel::new(vec![
        Err(ServiceError::Timeout(5)),
        Ok("An answer.".to_string()),
        Ok("Yes".to_string()),
    ]);
    let embedding = StubEmbedding::new(query_vector());
    let pipeline = RetrievalPipeline::new(
        store,
        llm,
        embedding.clone(),
        PipelineConfig::default(),
    );

    let answer = pipeline.answer("original question").await.unwrap();
    assert!(answer.supported);
    // Retrieval embedded the raw query, not a rewrite.
    assert_eq!(embedding.texts(), vec!["original question".to_string()]);
}

#[tokio::test]
async fn test_empty_rewrite_falls_back_to_raw_query() {
    let store = seeded_store(&["Some passage."]);
    let llm = StubLanguageModel::new(vec![
        Ok("   ".to_string()),
        Ok("An answer.".to_string()),
        Ok("Yes".to_string()),
    ]);
    let embedding = StubEmbedding::new(query_vector());
    let pipeline = RetrievalPipeline::new(
        store,
        llm,
        embedding.clone(),
        PipelineConfig::default(),
    );

    pipeline.answer("original question").await.unwrap();
    assert_eq!(embedding.texts(), vec!["original question".to_string()]);
}

#[tokio::test]
async fn test_reranking_reorders_context() {
    let store = seeded_store(&["alpha passage", "beta passage"]);
    let llm = StubLanguageModel::new(vec![
        Ok("gamma".to_string()),
        Ok("B.".to_string()),
        Ok("Yes".to_string()),
    ]);
    let embedding = StubEmbedding::new(query_vector());
    let pipeline = RetrievalPipeline::new(
        store,
        llm.clone(),
        embedding,
        PipelineConfig {
            retrieve_k: 10,
            top_n: 1,
        },
    )
    .with_scorer(StubScorer::with_scores(vec![0.1, 0.9]));

    pipeline.answer("which passage?").await.unwrap();

    // The scorer preferred the second candidate, so only it survives
    // the top-1 context cut.
    let prompts = llm.prompts();
    assert!(prompts[1].contains("beta passage"));
    assert!(!prompts[1].contains("alpha passage"));
}

#[tokio::test]
async fn test_rerank_failure_propagates() {
    let store = seeded_store(&["a passage"]);
    let llm = StubLanguageModel::new(vec![Ok("rewritten".to_string())]);
    let embedding = StubEmbedding::new(query_vector());
    let pipeline = RetrievalPipeline::new(
        store,
        llm,
        embedding,
        PipelineConfig::default(),
    )
    .with_scorer(StubScorer::failing());

    match pipeline.answer("q").await.unwrap_err() {
        PipelineError::Service { stage, .. } => assert_eq!(stage, "reranking"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_synthesis_failure_propagates() {
    let store = seeded_store(&["a passage"]);
    let llm = StubLanguageModel::new(vec![
        Ok("rewritten".to_string()),
        Err(ServiceError::Api {
            status: 500,
            message: "internal".to_string(),
        }),
    ]);
    let embedding = StubEmbedding::new(query_vector());
    let pipeline = RetrievalPipeline::new(
        store,
        llm,
        embedding,
        PipelineConfig::default(),
    );

    match pipeline.answer("q").await.unwrap_err() {
        PipelineError::Service { stage, .. } => assert_eq!(stage, "synthesis"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_validation_failure_propagates() {
    let store = seeded_store(&["a passage"]);
    let llm = StubLanguageModel::new(vec![
        Ok("rewritten".to_string()),
        Ok("answer".to_string()),
        Err(ServiceError::Timeout(1)),
    ]);
    let embedding = StubEmbedding::new(query_vector());
    let pipeline = RetrievalPipeline::new(
        store,
        llm,
        embedding,
        PipelineConfig::default(),
    );

    match pipeline.answer("q").await.unwrap_err() {
        PipelineError::Service { stage, .. } => assert_eq!(stage, "validation"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_scorer_skipped_when_nothing_retrieved() {
    let store = Arc::new(HybridStore::new(DistanceMetric::L2));
    let llm = StubLanguageModel::new(vec![
        Ok("rewritten".to_string()),
        Ok(UNKNOWN_ANSWER.to_string()),
        Ok("Yes".to_string()),
    ]);
    let embedding = StubEmbedding::new(query_vector());
    // A failing scorer proves the stage is skipped: calling it would
    // fail the request.
    let pipeline = RetrievalPipeline::new(
        store,
        llm,
        embedding,
        PipelineConfig::default(),
    )
    .with_scorer(StubScorer::failing());

    let answer = pipeline.answer("anything").await.unwrap();
    assert_eq!(answer.text, UNKNOWN_ANSWER);
}

#[tokio::test]
async fn test_top_n_limits_context() {
    let store = seeded_store(&["one", "two", "three"]);
    let llm = StubLanguageModel::new(vec![
        Ok("zzz".to_string()),
        Ok("answer".to_string()),
        Ok("Yes".to_string()),
    ]);
    let embedding = StubEmbedding::new(query_vector());
    let pipeline = RetrievalPipeline::new(
        store,
        llm.clone(),
        embedding,
        PipelineConfig {
            retrieve_k: 10,
            top_n: 2,
        },
    );

    pipeline.answer("q").await.unwrap();

    let prompts = llm.prompts();
    assert!(prompts[1].contains("one\n\ntwo"));
    assert!(!prompts[1].contains("three"));
}

#[test]
fn test_negative_signal_matches_whole_tokens() {
    assert!(has_negative_signal("No"));
    assert!(has_negative_signal("no."));
    assert!(has_negative_signal("No, not supported"));
    assert!(has_negative_signal("The answer is not supported"));
    assert!(!has_negative_signal("Yes"));
    assert!(!has_negative_signal("Yes, as far as I know"));
    assert!(!has_negative_signal("Absolutely, right now"));
}
