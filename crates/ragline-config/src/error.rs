//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value parsed fine but fails validation.
    #[error("Invalid {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// A `${VAR}` reference in the file has no value in the process
    /// environment.
    #[error("Environment variable {0} is not set")]
    EnvVarNotSet(String),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration is not valid TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}
