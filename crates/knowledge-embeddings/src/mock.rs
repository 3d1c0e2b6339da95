//! Deterministic mock provider for tests.
//!
//! Embeddings are bag-of-words vectors: each lowercase token adds weight
//! at a position derived from its hash. Texts sharing words therefore get
//! high cosine similarity, which is enough to exercise search ranking
//! without a live provider.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::EmbeddingError;
use crate::provider::{ChatMessage, Completion, ModelProvider};

/// Mock provider with call counting and failure injection.
pub struct MockModelProvider {
    dimension: usize,
    embed_calls: AtomicUsize,
    chat_calls: AtomicUsize,
    /// Texts containing this substring fail to embed
    fail_on: Option<String>,
}

impl MockModelProvider {
    /// Create a mock producing vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            embed_calls: AtomicUsize::new(0),
            chat_calls: AtomicUsize::new(0),
            fail_on: None,
        }
    }

    /// Fail any embed whose text contains `needle`.
    pub fn with_failure_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    /// Number of embed calls made (one per text, including group members).
    pub fn embed_call_count(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Number of chat completions made.
    pub fn chat_call_count(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    fn bag_of_words(&self, text: &str) -> Vec<f32> {
        let mut values = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let index = (hasher.finish() as usize) % self.dimension;
            values[index] += 1.0;
        }
        values
    }
}

impl Default for MockModelProvider {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl ModelProvider for MockModelProvider {
    async fn embed(&self, text: &str, _model: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(needle) = &self.fail_on {
            if text.contains(needle.as_str()) {
                return Err(EmbeddingError::Provider(format!(
                    "injected failure for text containing {:?}",
                    needle
                )));
            }
        }
        Ok(self.bag_of_words(text))
    }

    async fn chat_complete(&self, messages: &[ChatMessage]) -> Result<Completion, EmbeddingError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        let prompt_len: usize = messages.iter().map(|m| m.content.len()).sum();
        let text = messages
            .last()
            .map(|m| {
                let end = m.content.len().min(80);
                format!("Summary: {}", &m.content[..end])
            })
            .unwrap_or_else(|| "Summary: (empty)".to_string());
        Ok(Completion {
            text,
            prompt_tokens: (prompt_len / 4) as u32,
            completion_tokens: 20,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Embedding;

    #[tokio::test]
    async fn test_mock_is_deterministic() {
        let provider = MockModelProvider::new(64);
        let a = provider.embed("inventory stock levels", "m").await.unwrap();
        let b = provider.embed("inventory stock levels", "m").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(provider.embed_call_count(), 2);
    }

    #[tokio::test]
    async fn test_shared_words_are_similar() {
        let provider = MockModelProvider::new(256);
        let a = Embedding::new(provider.embed("warehouse inventory audit", "m").await.unwrap());
        let b = Embedding::new(provider.embed("inventory audit results", "m").await.unwrap());
        let c = Embedding::new(provider.embed("zebra quantum holiday", "m").await.unwrap());
        assert!(a.cosine_similarity(&b) > a.cosine_similarity(&c));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let provider = MockModelProvider::new(16).with_failure_on("poison");
        assert!(provider.embed("fine text", "m").await.is_ok());
        assert!(provider.embed("poison text", "m").await.is_err());
    }
}
