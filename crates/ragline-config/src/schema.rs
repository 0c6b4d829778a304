//! Configuration schema definitions.

use std::path::PathBuf;

use ragline_protocols::DistanceMetric;
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub corpus: CorpusConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub scorer: ScorerConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Size in characters of each streamed answer fragment.
    #[serde(default = "default_fragment_size")]
    pub fragment_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            fragment_size: default_fragment_size(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_fragment_size() -> usize {
    100
}

/// Corpus loading and chunking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory scanned for initial documents at startup.
    #[serde(default = "default_corpus_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Fixed path of the persisted vector index.
    #[serde(default = "default_vector_index_path")]
    pub vector_index_path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            dir: default_corpus_dir(),
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            vector_index_path: default_vector_index_path(),
        }
    }
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("data/corpus")
}

fn default_chunk_size() -> usize {
    500
}

fn default_overlap() -> usize {
    50
}

fn default_vector_index_path() -> PathBuf {
    PathBuf::from("data/index/vectors.json")
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Top-k taken from each of the lexical and vector indexes.
    #[serde(default = "default_k")]
    pub k: usize,

    /// Passages kept as context after reranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default)]
    pub metric: DistanceMetric,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            top_n: default_top_n(),
            metric: DistanceMetric::default(),
        }
    }
}

fn default_k() -> usize {
    10
}

fn default_top_n() -> usize {
    4
}

/// Chat completion service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: None,
            model: default_llm_model(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.0
}

fn default_timeout() -> u64 {
    30
}

/// Embedding service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding backend: "openai" or the offline "hash" fallback.
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            base_url: default_llm_base_url(),
            api_key: None,
            model: default_embedding_model(),
            dimension: default_dimension(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_embedding_provider() -> String {
    "hash".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimension() -> usize {
    384
}

/// Relevance scorer (reranker) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// When disabled, retrieval order stands unreranked.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_scorer_base_url")]
    pub base_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_scorer_model")]
    pub model: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_scorer_base_url(),
            api_key: None,
            model: default_scorer_model(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_scorer_base_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

fn default_scorer_model() -> String {
    "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string()
}
