//! Vector index trait and result types.

use knowledge_embeddings::Embedding;

use crate::error::VectorError;

/// One match from a vector search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Chunk reference (`{document_id}/{index}`)
    pub id: String,
    /// Cosine similarity in [-1, 1], higher is more similar
    pub similarity: f32,
}

impl SearchResult {
    pub fn new(id: String, similarity: f32) -> Self {
        Self { id, similarity }
    }
}

/// Index statistics.
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    /// Number of vectors in the index
    pub vector_count: usize,
    /// Embedding dimension
    pub dimension: usize,
}

/// Trait for vector indexes over chunk embeddings.
///
/// Implementations must be safe to share behind a lock; mutation happens
/// only on the ingest and compression paths.
pub trait VectorIndex: Send + Sync {
    /// The embedding dimension this index accepts.
    fn dimension(&self) -> usize;

    /// Number of vectors in the index.
    fn len(&self) -> usize;

    /// Whether the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a vector under the given id.
    /// Returns an error if the id already exists or dimensions differ.
    fn insert(&mut self, id: &str, embedding: &Embedding) -> Result<(), VectorError>;

    /// Remove a vector by id. Returns whether it was present.
    fn remove(&mut self, id: &str) -> bool;

    /// Whether an id is present.
    fn contains(&self, id: &str) -> bool;

    /// The `limit` best matches with similarity at or above
    /// `min_similarity`, sorted by similarity descending.
    fn search(&self, query: &Embedding, limit: usize, min_similarity: f32) -> Vec<SearchResult>;

    /// Remove every vector.
    fn clear(&mut self);

    /// Index statistics.
    fn stats(&self) -> IndexStats;
}
