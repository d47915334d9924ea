//! Engine configuration
//!
//! Loaded from YAML; every field has a default so partial files work:
//!
//! ```yaml
//! group_concat_separator: ", "
//! strict_errors: false
//! batch_size: 1024
//! log_level: debug
//! prefixes:
//!   ex: http://example.org/
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed YAML or unknown field
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Well-formed but unusable value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Expression engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// GROUP_CONCAT separator when the aggregate names none
    pub group_concat_separator: String,
    /// Propagate FILTER/BIND evaluation errors instead of dropping the
    /// solution or leaving the variable unbound
    pub strict_errors: bool,
    /// Solutions pulled per batch when collecting results
    pub batch_size: usize,
    /// Tracing level for the CLI (`error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: String,
    /// Extra prefixes for term parsing
    pub prefixes: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            group_concat_separator: " ".to_string(),
            strict_errors: false,
            batch_size: 1024,
            log_level: "info".to_string(),
            prefixes: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be positive".to_string()));
        }
        if !matches!(
            self.log_level.to_ascii_lowercase().as_str(),
            "error" | "warn" | "info" | "debug" | "trace"
        ) {
            return Err(ConfigError::Invalid(format!(
                "unknown log_level '{}'",
                self.log_level
            )));
        }
        Ok(())
    }
}
