//! # knowledge-vector
//!
//! Nearest-neighbor index over chunk embeddings using cosine similarity.
//!
//! The index stores one entry per chunk, keyed by a stable chunk
//! reference, and answers "best `limit` matches at or above
//! `min_similarity`" queries. The flat implementation scans every vector;
//! the trait seam allows an approximate backend to be swapped in.

pub mod error;
pub mod flat;
pub mod index;

pub use error::VectorError;
pub use flat::FlatIndex;
pub use index::{IndexStats, SearchResult, VectorIndex};
