//! # knowledge-storage
//!
//! RocksDB-backed persistence for the knowledge & memory subsystem.
//!
//! One column family per logical table: documents, chunks, conversations,
//! messages, message backups, message archive, clusters, conversation tags,
//! importance scores, domain registry, document-domain map, conversation
//! scopes, and the access audit log.
//!
//! Multi-key mutations that must be atomic (document ingest, the
//! compressor's backup-then-replace swap, cluster replacement) are executed
//! as a single `WriteBatch` so no partial state is ever observable.

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;

pub use column_families::*;
pub use db::Storage;
pub use error::StorageError;
pub use keys::{chunk_key, chunk_ref, parse_chunk_ref, MessageKey};
