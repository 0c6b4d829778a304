//! Embedding provider for OpenAI-compatible APIs.

use std::time::Duration;

use async_trait::async_trait;
use ragline_protocols::{EmbeddingProvider, ServiceError};

use crate::api::{EmbeddingsRequest, EmbeddingsResponse};
use crate::chat::request_error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`EmbeddingProvider`] backed by an OpenAI-compatible embeddings
/// endpoint.
///
/// The configured dimension is sent as the `dimensions` request
/// parameter and enforced on every returned vector, so the hybrid
/// store never sees a vector of unexpected length from this provider.
pub struct OpenAIEmbeddings {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    timeout: Duration,
}

impl OpenAIEmbeddings {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimension,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    fn id(&self) -> &str {
        "openai-embeddings"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| ServiceError::InvalidResponse("empty embeddings response".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingsRequest {
            model: self.model.clone(),
            input: texts.iter().map(|t| t.to_string()).collect(),
            dimensions: Some(self.dimension as u32),
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api { status, message });
        }

        let api_response: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        if api_response.data.len() != texts.len() {
            return Err(ServiceError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                api_response.data.len()
            )));
        }

        let mut data = api_response.data;
        data.sort_by_key(|object| object.index);

        let mut vectors = Vec::with_capacity(data.len());
        for object in data {
            if object.embedding.len() != self.dimension {
                return Err(ServiceError::InvalidResponse(format!(
                    "embedding {} has dimension {}, expected {}",
                    object.index,
                    object.embedding.len(),
                    self.dimension
                )));
            }
            vectors.push(object.embedding);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
