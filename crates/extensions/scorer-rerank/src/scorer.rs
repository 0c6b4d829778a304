//! HTTP client implementing [`RelevanceScorer`].

use std::time::Duration;

use async_trait::async_trait;
use ragline_protocols::{RelevanceScorer, ServiceError};

use crate::api::{RerankRequest, RerankResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Scores query/passage pairs through a remote rerank endpoint.
pub struct RerankScorer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl RerankScorer {
    /// Create a scorer client. `base_url` carries the API prefix up to
    /// but excluding `/rerank`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: None,
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/rerank", self.base_url.trim_end_matches('/'))
    }
}

fn request_error(err: reqwest::Error, timeout: Duration) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout(timeout.as_secs())
    } else {
        ServiceError::Network(err.to_string())
    }
}

#[async_trait]
impl RelevanceScorer for RerankScorer {
    fn id(&self) -> &str {
        "rerank-http"
    }

    async fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>, ServiceError> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let request = RerankRequest {
            model: self.model.clone(),
            query: query.to_string(),
            documents: passages.iter().map(|p| p.to_string()).collect(),
        };

        let mut builder = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api { status, message });
        }

        let body: RerankResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        if body.results.len() != passages.len() {
            return Err(ServiceError::InvalidResponse(format!(
                "expected {} rerank results, got {}",
                passages.len(),
                body.results.len()
            )));
        }

        // Results arrive ranked by relevance; put scores back into the
        // caller's passage order.
        let mut scores = vec![0.0f32; passages.len()];
        let mut seen = vec![false; passages.len()];
        for result in body.results {
            let slot = seen.get_mut(result.index).ok_or_else(|| {
                ServiceError::InvalidResponse(format!(
                    "rerank result index {} out of range",
                    result.index
                ))
            })?;
            if *slot {
                return Err(ServiceError::InvalidResponse(format!(
                    "duplicate rerank result index {}",
                    result.index
                )));
            }
            *slot = true;
            scores[result.index] = result.relevance_score;
        }

        Ok(scores)
    }
}
