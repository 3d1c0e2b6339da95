//! Flat (exact) cosine index.
//!
//! Stores normalized vectors contiguously and scans all of them per
//! query. Exact, predictable, and fast enough for the chunk counts this
//! subsystem sees; the `VectorIndex` seam exists for anything bigger.

use std::collections::HashMap;

use knowledge_embeddings::Embedding;
use tracing::debug;

use crate::error::VectorError;
use crate::index::{IndexStats, SearchResult, VectorIndex};

/// Exact nearest-neighbor index with a flat layout.
pub struct FlatIndex {
    dimension: usize,
    ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
    positions: HashMap<String, usize>,
}

impl FlatIndex {
    /// Create an empty index for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ids: Vec::new(),
            vectors: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn insert(&mut self, id: &str, embedding: &Embedding) -> Result<(), VectorError> {
        if embedding.dimension() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.dimension(),
            });
        }
        if self.positions.contains_key(id) {
            return Err(VectorError::DuplicateId(id.to_string()));
        }
        self.positions.insert(id.to_string(), self.ids.len());
        self.ids.push(id.to_string());
        self.vectors.push(embedding.values.clone());
        Ok(())
    }

    fn remove(&mut self, id: &str) -> bool {
        let Some(pos) = self.positions.remove(id) else {
            return false;
        };
        // Swap-remove keeps the layout dense; fix up the moved entry.
        self.ids.swap_remove(pos);
        self.vectors.swap_remove(pos);
        if pos < self.ids.len() {
            self.positions.insert(self.ids[pos].clone(), pos);
        }
        true
    }

    fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    fn search(&self, query: &Embedding, limit: usize, min_similarity: f32) -> Vec<SearchResult> {
        if limit == 0 || self.ids.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<SearchResult> = self
            .vectors
            .iter()
            .enumerate()
            .filter_map(|(pos, vector)| {
                if vector.len() != query.values.len() {
                    return None;
                }
                let similarity: f32 = vector
                    .iter()
                    .zip(query.values.iter())
                    .map(|(a, b)| a * b)
                    .sum();
                if similarity >= min_similarity {
                    Some(SearchResult::new(self.ids[pos].clone(), similarity))
                } else {
                    None
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);
        debug!(
            matches = results.len(),
            limit = limit,
            "Flat index search complete"
        );
        results
    }

    fn clear(&mut self) {
        self.ids.clear();
        self.vectors.clear();
        self.positions.clear();
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            vector_count: self.ids.len(),
            dimension: self.dimension,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(values: Vec<f32>) -> Embedding {
        Embedding::new(values)
    }

    #[test]
    fn test_insert_and_search_ranked() {
        let mut index = FlatIndex::new(2);
        index.insert("a", &emb(vec![1.0, 0.0])).unwrap();
        index.insert("b", &emb(vec![0.7, 0.7])).unwrap();
        index.insert("c", &emb(vec![0.0, 1.0])).unwrap();

        let results = index.search(&emb(vec![1.0, 0.0]), 10, -1.0);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "a");
        assert_eq!(results[1].id, "b");
        assert_eq!(results[2].id, "c");
    }

    #[test]
    fn test_min_similarity_filters() {
        let mut index = FlatIndex::new(2);
        index.insert("near", &emb(vec![1.0, 0.1])).unwrap();
        index.insert("far", &emb(vec![0.0, 1.0])).unwrap();

        let results = index.search(&emb(vec![1.0, 0.0]), 10, 0.5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "near");
    }

    #[test]
    fn test_limit_truncates() {
        let mut index = FlatIndex::new(2);
        for i in 0..5 {
            index
                .insert(&format!("v{}", i), &emb(vec![1.0, i as f32 * 0.01]))
                .unwrap();
        }
        assert_eq!(index.search(&emb(vec![1.0, 0.0]), 3, -1.0).len(), 3);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut index = FlatIndex::new(2);
        index.insert("a", &emb(vec![1.0, 0.0])).unwrap();
        assert!(matches!(
            index.insert("a", &emb(vec![0.0, 1.0])),
            Err(VectorError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut index = FlatIndex::new(3);
        assert!(matches!(
            index.insert("a", &emb(vec![1.0, 0.0])),
            Err(VectorError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_remove_swaps_positions_correctly() {
        let mut index = FlatIndex::new(2);
        index.insert("a", &emb(vec![1.0, 0.0])).unwrap();
        index.insert("b", &emb(vec![0.0, 1.0])).unwrap();
        index.insert("c", &emb(vec![0.7, 0.7])).unwrap();

        assert!(index.remove("a"));
        assert!(!index.remove("a"));
        assert_eq!(index.len(), 2);
        assert!(!index.contains("a"));

        // The moved entry must still be findable.
        let results = index.search(&emb(vec![0.0, 1.0]), 1, -1.0);
        assert_eq!(results[0].id, "b");
        let results = index.search(&emb(vec![1.0, 1.0]), 1, -1.0);
        assert_eq!(results[0].id, "c");
    }

    #[test]
    fn test_clear_and_stats() {
        let mut index = FlatIndex::new(2);
        index.insert("a", &emb(vec![1.0, 0.0])).unwrap();
        assert_eq!(index.stats().vector_count, 1);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.stats().vector_count, 0);
        assert_eq!(index.stats().dimension, 2);
    }

    #[test]
    fn test_zero_limit_returns_empty() {
        let mut index = FlatIndex::new(2);
        index.insert("a", &emb(vec![1.0, 0.0])).unwrap();
        assert!(index.search(&emb(vec![1.0, 0.0]), 0, -1.0).is_empty());
    }
}
