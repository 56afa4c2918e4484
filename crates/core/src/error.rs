//! Error types for StructRAG.
//!
//! A single error enum covers every failure class of the workspace:
//! configuration, I/O, generation, retrieval, prompt templates, routing
//! and cancellation.

use thiserror::Error;

/// Unified error type for StructRAG.
///
/// All fallible functions return `Result<T, AppError>`. Collaborator
/// failures are wrapped once and propagated, never retried here.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text generation errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Fragment retrieval errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Missing or malformed prompt templates
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// The router produced a structure tag outside the supported set
    #[error("Invalid route: '{0}' is not one of graph, table, algorithm, catalogue, chunk")]
    InvalidRoute(String),

    /// The request was cancelled before it completed
    #[error("Operation cancelled")]
    Cancelled,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Whether this error came from a cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
