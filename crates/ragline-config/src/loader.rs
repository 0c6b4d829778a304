//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schema::Config;

/// Loads TOML configuration.
///
/// `${VAR}` references anywhere in the file are replaced with the
/// corresponding environment variable before parsing; an unset variable
/// fails the load. Path fields (`corpus.dir`, `corpus.vector_index_path`)
/// support a leading `~`.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&expanded)?;
        config.corpus.dir = Self::expand_tilde(&config.corpus.dir);
        config.corpus.vector_index_path = Self::expand_tilde(&config.corpus.vector_index_path);
        Ok(config)
    }

    /// Replace every `${VAR}` with the value of `VAR`, failing on the
    /// first variable the environment does not define.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
        let mut missing: Option<String> = None;
        let expanded = re.replace_all(content, |caps: &regex::Captures| {
            let name = &caps[1];
            match std::env::var(name) {
                Ok(value) => value,
                Err(_) => {
                    missing.get_or_insert_with(|| name.to_string());
                    String::new()
                }
            }
        });
        match missing {
            Some(name) => Err(ConfigError::EnvVarNotSet(name)),
            None => Ok(expanded.into_owned()),
        }
    }

    fn expand_tilde(path: &Path) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
    }
}
