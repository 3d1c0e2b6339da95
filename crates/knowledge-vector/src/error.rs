//! Vector index error types.

use thiserror::Error;

/// Errors that can occur in the vector index.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Vector dimension does not match the index dimension
    #[error("Dimension mismatch: index has {expected}, vector has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// An entry with this id already exists
    #[error("Duplicate id: {0}")]
    DuplicateId(String),
}
