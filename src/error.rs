//! Error types for the Hearth capability bridge
//!
//! Structured errors are defined with thiserror; the binary layers anyhow
//! context on top.

use crate::analysis::AnalysisError;
use thiserror::Error;

/// Main error type for bridge operations
#[derive(Error, Debug)]
pub enum HearthError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Request parameters missing or of the wrong shape
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Tool name not in the registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Prompt name not in the registry
    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    /// Resource URI does not resolve to an existing file
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Subprocess bridge failure
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, HearthError>;

impl From<anyhow::Error> for HearthError {
    fn from(err: anyhow::Error) -> Self {
        HearthError::Other(err.to_string())
    }
}
