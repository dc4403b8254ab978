//! Error types shared across garimpo crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, GarimpoError>;

/// Base error type for garimpo
#[derive(Error, Debug)]
pub enum GarimpoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl GarimpoError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
