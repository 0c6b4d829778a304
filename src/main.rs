//! Ragline - Hybrid Retrieval Question Answering Service
//!
//! Main entry point for the ragline CLI and server.

mod loader;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ragline_api::{ApiConfig, ApiServer, AppState};
use ragline_config::{Config, ConfigLoader, ConfigValidator};
use ragline_index::{Chunker, HybridStore, VectorIndex};
use ragline_pipeline::{IngestionController, PipelineConfig, RetrievalPipeline};
use ragline_protocols::{Chunk, EmbeddedChunk, EmbeddingProvider, LanguageModel, RelevanceScorer};
use ragline_provider_openai::{HashEmbedding, OpenAIChatModel, OpenAIEmbeddings};
use ragline_scorer_rerank::RerankScorer;

/// Ragline CLI.
#[derive(Parser)]
#[command(name = "ragline")]
#[command(about = "Hybrid retrieval question answering service")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server in foreground (default)
    Serve {
        /// Server host (overrides the configuration file)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides the configuration file)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Check the configuration file and exit
    ValidateConfig,
}

/// Initialize tracing with console and file output.
///
/// Log files are written to logs/ with daily rotation; the last 30 days
/// are kept.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("ragline")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The writer guard must live as long as the process or file output
    // stops flushing.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        // Console layer (human-readable, with colors)
        .with(fmt::layer().with_target(true).with_ansi(true))
        // File layer (no colors)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        None => run_server(cli.config, None, None).await,
        Some(Commands::Serve { host, port }) => run_server(cli.config, host, port).await,
        Some(Commands::ValidateConfig) => validate_config(&cli.config),
    }
}

/// Load the configuration, fail on invalid values, and log warnings.
fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = ConfigLoader::load(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    let warnings = ConfigValidator::ensure(&config)?;
    for warning in &warnings {
        warn!(field = %warning.path, "{}", warning.message);
    }
    Ok(config)
}

/// Check a configuration file and report every problem found.
fn validate_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load(path)?;
    let result = ConfigValidator::validate(&config);

    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    if result.is_valid() {
        println!("{}: configuration is valid", path.display());
        Ok(())
    } else {
        Err(format!("{} configuration error(s)", result.errors.len()).into())
    }
}

/// Run the server in foreground.
async fn run_server(
    config_path: PathBuf,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting ragline v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_path.display());

    let config = load_config(&config_path)?;

    let chunker = Chunker::new(config.corpus.chunk_size, config.corpus.overlap)?;
    let llm = build_language_model(&config);
    let embedding = build_embedding(&config);
    info!(
        llm = llm.id(),
        model = %config.llm.model,
        embedding = embedding.id(),
        dimension = embedding.dimension(),
        "providers configured"
    );

    let store = build_store(&config, embedding.as_ref(), chunker).await?;

    let pipeline_config = PipelineConfig {
        retrieve_k: config.retrieval.k,
        top_n: config.retrieval.top_n,
    };
    let mut pipeline =
        RetrievalPipeline::new(store.clone(), llm, embedding.clone(), pipeline_config);
    if let Some(scorer) = build_scorer(&config) {
        info!(base_url = %config.scorer.base_url, model = %config.scorer.model, "reranking enabled");
        pipeline = pipeline.with_scorer(scorer);
    }

    let ingestion = IngestionController::new(store.clone(), embedding, chunker);

    let state = Arc::new(AppState::new(
        Arc::new(pipeline),
        Arc::new(ingestion),
        store,
        config.server.fragment_size,
    ));

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let server = ApiServer::new(ApiConfig::new(host, port), state);

    info!("Ragline ready at http://{}", server.addr());
    info!("  POST /chat    - answer a question from the corpus");
    info!("  POST /ingest  - add documents to the index");
    info!("  GET  /health  - service status");

    // Blocks until shutdown.
    server.run().await?;

    info!("Shutting down...");
    Ok(())
}

fn build_language_model(config: &Config) -> Arc<dyn LanguageModel> {
    let model = OpenAIChatModel::new(
        &config.llm.base_url,
        config.llm.api_key.as_deref().unwrap_or_default(),
        &config.llm.model,
    )
    .with_temperature(config.llm.temperature)
    .with_timeout(Duration::from_secs(config.llm.timeout_seconds));
    Arc::new(model)
}

fn build_embedding(config: &Config) -> Arc<dyn EmbeddingProvider> {
    match config.embedding.provider.as_str() {
        "openai" => Arc::new(
            OpenAIEmbeddings::new(
                &config.embedding.base_url,
                config.embedding.api_key.as_deref().unwrap_or_default(),
                &config.embedding.model,
                config.embedding.dimension,
            )
            .with_timeout(Duration::from_secs(config.embedding.timeout_seconds)),
        ),
        // Anything else was rejected by validation; "hash" lands here.
        _ => Arc::new(HashEmbedding::new(config.embedding.dimension)),
    }
}

fn build_scorer(config: &Config) -> Option<Arc<dyn RelevanceScorer>> {
    if !config.scorer.enabled {
        return None;
    }
    let mut scorer = RerankScorer::new(&config.scorer.base_url, &config.scorer.model)
        .with_timeout(Duration::from_secs(config.scorer.timeout_seconds));
    if let Some(key) = &config.scorer.api_key {
        scorer = scorer.with_api_key(key);
    }
    Some(Arc::new(scorer))
}

/// Load the corpus and build the hybrid store behind the server.
///
/// When a persisted vector index still matches the chunked corpus (same
/// passage count and dimension) its vectors are reused and the embedding
/// call is skipped; otherwise the corpus is embedded fresh and the new
/// index saved. The lexical index is always rebuilt in memory.
async fn build_store(
    config: &Config,
    embedding: &dyn EmbeddingProvider,
    chunker: Chunker,
) -> anyhow::Result<Arc<HybridStore>> {
    let store = Arc::new(HybridStore::new(config.retrieval.metric));

    let documents = loader::load_corpus(&config.corpus.dir)
        .with_context(|| format!("failed to read corpus from {}", config.corpus.dir.display()))?;
    if documents.is_empty() {
        warn!(dir = %config.corpus.dir.display(), "no corpus documents found, starting empty");
        return Ok(store);
    }

    let chunks: Vec<Chunk> = documents.iter().flat_map(|doc| chunker.split(doc)).collect();
    info!(
        documents = documents.len(),
        passages = chunks.len(),
        "corpus chunked"
    );

    let index_path = &config.corpus.vector_index_path;
    let persisted = load_compatible_vectors(index_path, &chunks, embedding.dimension());
    let reusing = persisted.is_some();
    let embeddings = match persisted {
        Some(vectors) => vectors,
        None => {
            info!(
                provider = embedding.id(),
                passages = chunks.len(),
                "embedding corpus"
            );
            let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
            embedding
                .embed_batch(&texts)
                .await
                .context("corpus embedding failed")?
        }
    };

    let batch: Vec<EmbeddedChunk> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, vector)| EmbeddedChunk::new(chunk, vector))
        .collect();
    let appended = store.append(batch)?;
    info!(passages = appended, "hybrid store ready");

    if !reusing {
        if let Some(parent) = index_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        store.save_vectors(index_path)?;
        info!(path = %index_path.display(), "vector index saved");
    }

    Ok(store)
}

/// Read persisted vectors back if they still describe this corpus.
fn load_compatible_vectors(
    path: &Path,
    chunks: &[Chunk],
    dimension: usize,
) -> Option<Vec<Vec<f32>>> {
    if !path.exists() {
        return None;
    }
    let index = match VectorIndex::load(path) {
        Ok(index) => index,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "persisted vector index unreadable, rebuilding");
            return None;
        }
    };
    if index.len() != chunks.len() || index.dimension() != Some(dimension) {
        info!(
            persisted = index.len(),
            current = chunks.len(),
            "persisted vector index out of date, rebuilding"
        );
        return None;
    }
    info!(path = %path.display(), vectors = index.len(), "reusing persisted vector index");
    Some(index.vectors().to_vec())
}
