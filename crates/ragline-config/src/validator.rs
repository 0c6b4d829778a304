//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_corpus(config, &mut result);
        Self::validate_retrieval(config, &mut result);
        Self::validate_llm(config, &mut result);
        Self::validate_embedding(config, &mut result);
        Self::validate_scorer(config, &mut result);

        result
    }

    /// Validate and turn the first error into a hard failure,
    /// returning the accumulated warnings otherwise.
    pub fn ensure(config: &Config) -> Result<Vec<ValidationWarning>, ConfigError> {
        let result = Self::validate(config);
        if let Some(error) = result.errors.into_iter().next() {
            return Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            });
        }
        Ok(result.warnings)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }

        if config.server.fragment_size == 0 {
            result.add_error(ValidationError::new(
                "server.fragment_size",
                "fragment_size must be greater than 0",
            ));
        }
    }

    fn validate_corpus(config: &Config, result: &mut ValidationResult) {
        if config.corpus.chunk_size == 0 {
            result.add_error(ValidationError::new(
                "corpus.chunk_size",
                "chunk_size must be greater than 0",
            ));
        } else if config.corpus.overlap >= config.corpus.chunk_size {
            result.add_error(ValidationError::new(
                "corpus.overlap",
                format!(
                    "overlap ({}) must be smaller than chunk_size ({})",
                    config.corpus.overlap, config.corpus.chunk_size
                ),
            ));
        }

        if !config.corpus.dir.exists() {
            result.add_warning(ValidationWarning::new(
                "corpus.dir",
                format!(
                    "Corpus directory does not exist: {:?}, startup begins with an empty store",
                    config.corpus.dir
                ),
            ));
        }
    }

    fn validate_retrieval(config: &Config, result: &mut ValidationResult) {
        if config.retrieval.k == 0 {
            result.add_error(ValidationError::new(
                "retrieval.k",
                "k must be greater than 0",
            ));
        }

        if config.retrieval.top_n == 0 {
            result.add_error(ValidationError::new(
                "retrieval.top_n",
                "top_n must be greater than 0",
            ));
        }

        if config.retrieval.top_n > config.retrieval.k {
            result.add_error(ValidationError::new(
                "retrieval.top_n",
                format!(
                    "top_n ({}) must not exceed k ({})",
                    config.retrieval.top_n, config.retrieval.k
                ),
            ));
        }
    }

    fn validate_llm(config: &Config, result: &mut ValidationResult) {
        Self::check_base_url("llm.base_url", &config.llm.base_url, result);

        if config.llm.api_key.is_none() {
            result.add_warning(ValidationWarning::new(
                "llm.api_key",
                "api_key is not set; supply it directly or with a ${VAR} reference",
            ));
        }

        if config.llm.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "llm.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }

        if !(0.0..=2.0).contains(&config.llm.temperature) {
            result.add_error(ValidationError::new(
                "llm.temperature",
                "temperature must be between 0.0 and 2.0",
            ));
        }
    }

    fn validate_embedding(config: &Config, result: &mut ValidationResult) {
        let valid_providers = ["openai", "hash"];
        if !valid_providers.contains(&config.embedding.provider.as_str()) {
            result.add_error(ValidationError::new(
                "embedding.provider",
                format!(
                    "Unknown embedding provider '{}', valid values: {:?}",
                    config.embedding.provider, valid_providers
                ),
            ));
        }

        if config.embedding.dimension == 0 {
            result.add_error(ValidationError::new(
                "embedding.dimension",
                "dimension must be greater than 0",
            ));
        }

        if config.embedding.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "embedding.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }

        if config.embedding.provider == "openai" {
            Self::check_base_url("embedding.base_url", &config.embedding.base_url, result);
            if config.embedding.api_key.is_none() {
                result.add_warning(ValidationWarning::new(
                    "embedding.api_key",
                    "api_key is not set; supply it directly or with a ${VAR} reference",
                ));
            }
        }
    }

    fn validate_scorer(config: &Config, result: &mut ValidationResult) {
        if !config.scorer.enabled {
            return;
        }

        Self::check_base_url("scorer.base_url", &config.scorer.base_url, result);

        if config.scorer.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "scorer.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }
    }

    fn check_base_url(path: &str, url: &str, result: &mut ValidationResult) {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            result.add_error(ValidationError::new(
                path,
                "base_url must start with http:// or https://",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
