//! Compression error types.

use thiserror::Error;

/// Errors that can occur during compression.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// Storage layer failure
    #[error("Storage error: {0}")]
    Storage(#[from] knowledge_storage::StorageError),

    /// Summarizer failure; aborts the compression before any write
    #[error("Summarizer error: {0}")]
    Summarizer(String),
}
