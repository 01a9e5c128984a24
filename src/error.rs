//! Error types for Mailroute
//!
//! `AppError` covers configuration and construction failures. Per-attempt
//! dispatch failures use `providers::ProviderError` and are handled internally
//! by the fallback loop; they never surface through this type.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed for {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
