//! Knowledge store error types.

use thiserror::Error;

/// Errors that can occur in the knowledge store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage layer failure
    #[error("Storage error: {0}")]
    Storage(#[from] knowledge_storage::StorageError),

    /// Embedding failure that the caller explicitly depends on
    #[error("Embedding error: {0}")]
    Embedding(#[from] knowledge_embeddings::EmbeddingError),

    /// Vector index failure
    #[error("Vector index error: {0}")]
    Vector(#[from] knowledge_vector::VectorError),

    /// Input rejected before any side effect
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
