//! Errors raised while loading and checking the runner configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur before the device is ever contacted.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read configuration file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Not valid TOML, or a value of the wrong type (e.g. an unknown target)
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// `--print-config` could not render the configuration
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A value the procedure cannot run with, such as a summary pattern
    /// without three capture groups
    #[error("Invalid configuration value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    /// A `UNITY_HIL_*`, `ESPPORT` or `ESPBAUD` override did not parse
    #[error("Failed to parse environment variable '{var}': {message}")]
    EnvParseError { var: String, message: String },

    /// The selected target needs a setting that is absent (serial port or
    /// process command)
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

impl ConfigError {
    /// Create a validation error
    pub fn validation<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self::ValidationError {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an env parse error
    pub fn env_parse<V: Into<String>, M: Into<String>>(var: V, message: M) -> Self {
        Self::EnvParseError {
            var: var.into(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
