//! Clustering error types.

use thiserror::Error;

/// Errors that can occur during clustering.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Storage layer failure
    #[error("Storage error: {0}")]
    Storage(#[from] knowledge_storage::StorageError),

    /// Referenced conversation does not exist
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// Conversation has no embedding to compare against
    #[error("Conversation has no embedding: {0}")]
    NoEmbedding(String),
}
