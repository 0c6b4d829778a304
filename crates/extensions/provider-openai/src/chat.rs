//! Chat completion provider for OpenAI-compatible APIs.

use std::time::Duration;

use async_trait::async_trait;
use ragline_protocols::{LanguageModel, ServiceError};

use crate::api::{ChatMessage, ChatRequest, ChatResponse};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`LanguageModel`] backed by an OpenAI-compatible chat completions
/// endpoint.
pub struct OpenAIChatModel {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAIChatModel {
    /// Create a model client. `base_url` carries the API prefix up to
    /// but excluding `/chat/completions` (e.g.
    /// `https://api.groq.com/openai/v1`).
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.0,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    fn id(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: Some(self.temperature),
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

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::InvalidResponse("no choices in response".to_string()))?;
        choice
            .message
            .content
            .ok_or_else(|| ServiceError::InvalidResponse("empty message content".to_string()))
    }
}

pub(crate) fn request_error(err: reqwest::Error, timeout: Duration) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout(timeout.as_secs())
    } else {
        ServiceError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id() {
        let model = OpenAIChatModel::new("https://api.openai.com/v1", "key", "gpt-4o-mini");
        assert_eq!(model.id(), "openai");
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let model = OpenAIChatModel::new("https://api.openai.com/v1/", "key", "gpt-4o-mini");
        assert_eq!(
            model.endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_builder_methods() {
        let model = OpenAIChatModel::new("https://x", "key", "m")
            .with_temperature(0.7)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(model.temperature, 0.7);
        assert_eq!(model.timeout, Duration::from_secs(5));
    }

    // Wiremock-based tests for actual HTTP calls
    mod http_tests {
        use super::*;
        use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

        fn chat_body(content: &str) -> serde_json::Value {
            serde_json::json!({
                "id": "chatcmpl-123",
                "model": "gpt-4o-mini",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": content},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            })
        }

        #[tokio::test]
        async fn test_complete_success() {
            let mock_server = MockServer::start().await;

            Mock::given(matchers::method("POST"))
                .and(matchers::path("/chat/completions"))
                .and(matchers::header("Authorization", "Bearer test-key"))
                .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Hello back!")))
                .expect(1)
                .mount(&mock_server)
                .await;

            let model = OpenAIChatModel::new(mock_server.uri(), "test-key", "gpt-4o-mini");
            let result = model.complete("Hello").await.unwrap();
            assert_eq!(result, "Hello back!");
        }

        #[tokio::test]
        async fn test_complete_sends_configured_model_and_temperature() {
            let mock_server = MockServer::start().await;

            Mock::given(matchers::method("POST"))
                .and(matchers::path("/chat/completions"))
                .and(matchers::body_partial_json(serde_json::json!({
                    "model": "llama-3.1-8b-instant",
                    "temperature": 0.0
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("ok")))
                .expect(1)
                .mount(&mock_server)
                .await;

            let model = OpenAIChatModel::new(mock_server.uri(), "key", "llama-3.1-8b-instant");
            assert!(model.complete("question").await.is_ok());
        }

        #[tokio::test]
        async fn test_complete_api_error() {
            let mock_server = MockServer::start().await;

            let error_body =
                r#"{"error": {"message": "Invalid API key", "type": "invalid_request_error"}}"#;

            Mock::given(matchers::method("POST"))
                .and(matchers::path("/chat/completions"))
                .respond_with(ResponseTemplate::new(401).set_body_string(error_body))
                .expect(1)
                .mount(&mock_server)
                .await;

            let model = OpenAIChatModel::new(mock_server.uri(), "bad-key", "gpt-4o-mini");
            match model.complete("Hello").await.unwrap_err() {
                ServiceError::Api { status, message } => {
                    assert_eq!(status, 401);
                    assert!(message.contains("Invalid API key"));
                }
                other => panic!("Expected Api error, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_complete_server_error() {
            let mock_server = MockServer::start().await;

            Mock::given(matchers::method("POST"))
                .and(matchers::path("/chat/completions"))
                .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
                .expect(1)
                .mount(&mock_server)
                .await;

            let model = OpenAIChatModel::new(mock_server.uri(), "key", "gpt-4o-mini");
            match model.complete("Hello").await.unwrap_err() {
                ServiceError::Api { status, .. } => assert_eq!(status, 500),
                other => panic!("Expected Api error, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_complete_timeout() {
            let mock_server = MockServer::start().await;

            Mock::given(matchers::method("POST"))
                .and(matchers::path("/chat/completions"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(chat_body("late"))
                        .set_delay(Duration::from_millis(500)),
                )
                .mount(&mock_server)
                .await;

            let model = OpenAIChatModel::new(mock_server.uri(), "key", "gpt-4o-mini")
                .with_timeout(Duration::from_millis(50));
            match model.complete("Hello").await.unwrap_err() {
                ServiceError::Timeout(_) => {}
                other => panic!("Expected Timeout, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_complete_empty_choices() {
            let mock_server = MockServer::start().await;

            Mock::given(matchers::method("POST"))
                .and(matchers::path("/chat/completions"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "id": "chatcmpl-void",
                    "model": "gpt-4o-mini",
                    "choices": [],
                    "usage": null
                })))
                .mount(&mock_server)
                .await;

            let model = OpenAIChatModel::new(mock_server.uri(), "key", "gpt-4o-mini");
            match model.complete("Hello").await.unwrap_err() {
                ServiceError::InvalidResponse(message) => assert!(message.contains("no choices")),
                other => panic!("Expected InvalidResponse, got {other:?}"),
            }
        }
    }
}
