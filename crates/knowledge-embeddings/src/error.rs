//! Embedding error types.

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Provider returned an error or an unusable response
    #[error("Provider error: {0}")]
    Provider(String),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Input rejected before reaching the provider
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Returned vector does not match the model's declared dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Binary encoding/decoding error
    #[error("Binary encoding error: {0}")]
    Binary(String),

    /// Invalid client or provider configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Batch cancelled between groups
    #[error("Batch cancelled")]
    Cancelled,
}
