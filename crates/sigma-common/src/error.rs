//! Error types for sigma-tap

use thiserror::Error;

/// Result type alias for sigma-tap operations
pub type Result<T> = std::result::Result<T, TapError>;

/// Main error type for sigma-tap
#[derive(Error, Debug)]
pub enum TapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Schema inference error: {0}")]
    SchemaInference(String),

    #[error("Transform error for field '{field}': {reason}")]
    Transform { field: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TapError {
    /// Construct a network error from anything displayable
    pub fn network(msg: impl std::fmt::Display) -> Self {
        TapError::Network(msg.to_string())
    }

    /// Construct a parse error from anything displayable
    pub fn parse(msg: impl std::fmt::Display) -> Self {
        TapError::Parse(msg.to_string())
    }
}
