//! # knowledge-store
//!
//! Ingests documents, splits them into bounded-size chunks, embeds the
//! chunks, and serves relevance-ranked search over the vector index.
//!
//! Ingestion is transactional: the document row and every chunk row land
//! in one storage batch. A chunk whose embedding fails is still persisted
//! (flagged as pending) so content is never lost; it stays out of vector
//! search until `retry_pending_embeddings` succeeds.

pub mod chunker;
pub mod error;
pub mod store;

pub use chunker::{chunk_text, ChunkerConfig};
pub use error::StoreError;
pub use store::{DocumentPage, DocumentUpdate, KnowledgeStore, SearchHit, StoreConfig};
