//! # knowledge-embeddings
//!
//! Turns text into fixed-length vectors through an external provider,
//! memoized by a bounded TTL cache keyed on `hash(model + text)`.
//!
//! - `ModelProvider`: async trait over the external embedding/completion
//!   API, with an OpenAI-compatible HTTP implementation and a
//!   deterministic mock for tests
//! - `EmbeddingClient`: validation, cache lookup, dimension checks, and
//!   rate-limited batch embedding with cancellation between groups
//! - `binary`: compact little-endian f32 encoding for storing vectors
//!   outside the vector index

pub mod api;
pub mod binary;
pub mod cache;
pub mod client;
pub mod error;
pub mod mock;
pub mod model;
pub mod provider;

pub use api::{ApiModelProvider, ApiProviderConfig};
pub use binary::{from_binary, to_binary};
pub use cache::{cache_key, EmbeddingCache};
pub use client::{EmbeddingClient, EmbeddingConfig};
pub use error::EmbeddingError;
pub use mock::MockModelProvider;
pub use model::{declared_dimension, find_similar, Embedding, DEFAULT_EMBEDDING_MODEL};
pub use provider::{ChatMessage, Completion, ModelProvider};
