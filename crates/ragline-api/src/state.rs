//! Application state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use ragline_index::HybridStore;
use ragline_pipeline::{IngestionController, RetrievalPipeline};

/// Application state shared across handlers.
pub struct AppState {
    pub pipeline: Arc<RetrievalPipeline>,
    pub ingestion: Arc<IngestionController>,
    pub store: Arc<HybridStore>,
    /// Size in characters of each streamed answer fragment.
    pub fragment_size: usize,
    start_time: Instant,
    request_count: AtomicU64,
}

impl AppState {
    pub fn new(
        pipeline: Arc<RetrievalPipeline>,
        ingestion: Arc<IngestionController>,
        store: Arc<HybridStore>,
        fragment_size: usize,
    ) -> Self {
        Self {
            pipeline,
            ingestion,
            store,
            fragment_size,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    /// Count a request and return its ordinal.
    pub fn record_request(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
