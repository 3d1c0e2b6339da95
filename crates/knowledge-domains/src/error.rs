//! Domain access error types.

use thiserror::Error;

/// Errors that can occur in domain access control.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Storage layer failure
    #[error("Storage error: {0}")]
    Storage(#[from] knowledge_storage::StorageError),

    /// Knowledge store failure during domain-aware search
    #[error("Store error: {0}")]
    Store(#[from] knowledge_store::StoreError),

    /// Attempt to switch into a domain marked inactive in the registry
    #[error("Domain '{0}' is not active")]
    InactiveDomain(String),

    /// God-mode request rejected by the configured authorizer
    #[error("God mode denied for conversation '{conversation_id}': {reason}")]
    NotAuthorized {
        conversation_id: String,
        reason: String,
    },
}
