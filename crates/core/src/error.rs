//! Core error types

use thiserror::Error;

/// Core error type for keypost
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration is structurally valid but semantically unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
