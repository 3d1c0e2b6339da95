//! Embedding vector type and model registry.

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Declared vector dimension for known models.
///
/// Returns `None` for unknown models; unknown dimensions are accepted
/// without validation.
pub fn declared_dimension(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" => Some(1536),
        "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

/// Vector embedding, normalized to unit length.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// The embedding vector
    pub values: Vec<f32>,
}

impl Embedding {
    /// Create a new embedding, normalizing to unit length.
    pub fn new(values: Vec<f32>) -> Self {
        let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        let normalized = if norm > 0.0 {
            values.iter().map(|x| x / norm).collect()
        } else {
            values
        };
        Self { values: normalized }
    }

    /// Create an embedding from values that are already unit length.
    pub fn from_normalized(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Vector dimension.
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Cosine similarity with another embedding, in [-1, 1].
    ///
    /// Both vectors are unit length, so this is just the dot product.
    /// Mismatched dimensions yield 0.0.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() {
            return 0.0;
        }
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }
}

/// Rank `candidates` by cosine similarity to `query`, best first,
/// returning at most `top_k` ids with their scores.
pub fn find_similar<'a, I>(query: &Embedding, candidates: I, top_k: usize) -> Vec<(String, f32)>
where
    I: IntoIterator<Item = (&'a str, &'a Embedding)>,
{
    let mut scored: Vec<(String, f32)> = candidates
        .into_iter()
        .map(|(id, emb)| (id.to_string(), query.cosine_similarity(emb)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}
