//! Scoring error types.

use thiserror::Error;

/// Errors that can occur during importance scoring.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Storage layer failure
    #[error("Storage error: {0}")]
    Storage(#[from] knowledge_storage::StorageError),
}
