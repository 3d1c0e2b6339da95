//! Embedding client: validation, caching, and rate-limited batching on
//! top of a `ModelProvider`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::{cache_key, EmbeddingCache};
use crate::error::EmbeddingError;
use crate::model::{declared_dimension, Embedding, DEFAULT_EMBEDDING_MODEL};
use crate::provider::ModelProvider;

/// Embedding client configuration.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Default embedding model
    pub model: String,
    /// Texts shorter than this are rejected
    pub min_text_chars: usize,
    /// Texts longer than this are truncated with a warning
    pub max_text_chars: usize,
    /// Uncached texts per provider group call
    pub batch_group_size: usize,
    /// Pause between group calls to respect provider rate limits
    pub batch_pause: Duration,
    /// Maximum cached vectors
    pub cache_capacity: usize,
    /// Cache entry time-to-live
    pub cache_ttl: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            min_text_chars: 3,
            max_text_chars: 8000,
            batch_group_size: 16,
            batch_pause: Duration::from_millis(200),
            cache_capacity: 4096,
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

/// Client for generating embeddings with memoization.
///
/// Shared, read-mostly: the cache is the only interior state, behind a
/// mutex held just for lookups and inserts.
pub struct EmbeddingClient {
    provider: Arc<dyn ModelProvider>,
    cache: Mutex<EmbeddingCache>,
    config: EmbeddingConfig,
}

impl EmbeddingClient {
    /// Create a client over the given provider.
    pub fn new(provider: Arc<dyn ModelProvider>, config: EmbeddingConfig) -> Self {
        let cache = Mutex::new(EmbeddingCache::new(config.cache_capacity, config.cache_ttl));
        Self {
            provider,
            cache,
            config,
        }
    }

    /// The configured default model.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Access the underlying provider (for completion calls).
    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    /// Validate and normalize input text.
    ///
    /// Too-short text is rejected; too-long text is truncated at a char
    /// boundary with a warning.
    fn prepare_text<'a>(&self, text: &'a str) -> Result<&'a str, EmbeddingError> {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.config.min_text_chars {
            return Err(EmbeddingError::InvalidInput(format!(
                "text shorter than {} chars",
                self.config.min_text_chars
            )));
        }
        if trimmed.chars().count() > self.config.max_text_chars {
            warn!(
                len = trimmed.chars().count(),
                max = self.config.max_text_chars,
                "Truncating over-long text before embedding"
            );
            let mut end = 0;
            for (count, (offset, ch)) in trimmed.char_indices().enumerate() {
                if count == self.config.max_text_chars {
                    break;
                }
                end = offset + ch.len_utf8();
            }
            return Ok(&trimmed[..end]);
        }
        Ok(trimmed)
    }

    /// Warn when the provider's vector does not match the model's
    /// declared dimension. Mismatch is logged, not fatal.
    fn check_dimension(&self, model: &str, values: &[f32]) {
        if let Some(expected) = declared_dimension(model) {
            if values.len() != expected {
                warn!(
                    model = model,
                    expected = expected,
                    actual = values.len(),
                    "Embedding dimension does not match declared model dimension"
                );
            }
        }
    }

    /// Embed a single text with the default model.
    pub async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let model = self.config.model.clone();
        self.embed_with_model(text, &model).await
    }

    /// Embed a single text with an explicit model.
    ///
    /// Checks the memo cache first; on a miss the provider is called and
    /// the result cached. Provider failures propagate to the caller.
    pub async fn embed_with_model(
        &self,
        text: &str,
        model: &str,
    ) -> Result<Embedding, EmbeddingError> {
        let prepared = self.prepare_text(text)?;
        let key = cache_key(model, prepared);

        if let Some(values) = self.lock_cache().get(key) {
            debug!(model = model, "Embedding cache hit");
            return Ok(Embedding::from_normalized(values));
        }

        let values = self.provider.embed(prepared, model).await?;
        if values.is_empty() {
            return Err(EmbeddingError::Provider("empty embedding".to_string()));
        }
        self.check_dimension(model, &values);

        let embedding = Embedding::new(values);
        self.lock_cache().insert(key, embedding.values.clone());
        Ok(embedding)
    }

    /// Embed many texts, returning `input index -> embedding`.
    ///
    /// Invalid texts and per-item provider failures are logged and
    /// skipped without aborting the batch. Uncached texts go to the
    /// provider in fixed-size groups with a pause between groups; the
    /// optional token cancels between groups, keeping whatever was
    /// already embedded.
    pub async fn embed_batch(
        &self,
        texts: &[String],
        cancel: Option<&CancellationToken>,
    ) -> HashMap<usize, Embedding> {
        let model = self.config.model.clone();
        let mut results: HashMap<usize, Embedding> = HashMap::new();
        let mut pending: Vec<(usize, String, u64)> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let prepared = match self.prepare_text(text) {
                Ok(p) => p,
                Err(e) => {
                    warn!(index = i, error = %e, "Skipping invalid batch item");
                    continue;
                }
            };
            let key = cache_key(&model, prepared);
            if let Some(values) = self.lock_cache().get(key) {
                results.insert(i, Embedding::from_normalized(values));
            } else {
                pending.push((i, prepared.to_string(), key));
            }
        }

        let groups: Vec<&[(usize, String, u64)]> =
            pending.chunks(self.config.batch_group_size.max(1)).collect();
        let group_count = groups.len();

        for (group_no, group) in groups.into_iter().enumerate() {
            let group_texts: Vec<String> = group.iter().map(|(_, t, _)| t.clone()).collect();
            let outcomes = self.provider.embed_many(&group_texts, &model).await;

            for ((index, _, key), outcome) in group.iter().zip(outcomes) {
                match outcome {
                    Ok(values) if !values.is_empty() => {
                        self.check_dimension(&model, &values);
                        let embedding = Embedding::new(values);
                        self.lock_cache().insert(*key, embedding.values.clone());
                        results.insert(*index, embedding);
                    }
                    Ok(_) => {
                        warn!(index = index, "Provider returned empty vector, skipping");
                    }
                    Err(e) => {
                        warn!(index = index, error = %e, "Embedding failed, skipping item");
                    }
                }
            }

            if group_no + 1 < group_count {
                if let Some(token) = cancel {
                    if token.is_cancelled() {
                        warn!(
                            embedded = results.len(),
                            remaining = pending.len() - (group_no + 1) * group.len(),
                            "Batch cancelled between groups"
                        );
                        break;
                    }
                }
                tokio::time::sleep(self.config.batch_pause).await;
            }
        }

        results
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, EmbeddingCache> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockModelProvider;

    fn client_with_mock(dimension: usize) -> (Arc<MockModelProvider>, EmbeddingClient) {
        let provider = Arc::new(MockModelProvider::new(dimension));
        let config = EmbeddingConfig {
            batch_pause: Duration::ZERO,
            ..EmbeddingConfig::default()
        };
        let client = EmbeddingClient::new(provider.clone(), config);
        (provider, client)
    }

    #[tokio::test]
    async fn test_embed_caches_second_call() {
        let (provider, client) = client_with_mock(64);

        let first = client.embed("inventory levels are low").await.unwrap();
        let second = client.embed("inventory levels are low").await.unwrap();

        assert_eq!(first.values, second.values);
        assert_eq!(provider.embed_call_count(), 1, "second call must hit cache");
    }

    #[tokio::test]
    async fn test_embed_rejects_short_text() {
        let (_provider, client) = client_with_mock(64);
        let err = client.embed("ab").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_embed_truncates_long_text() {
        let provider = Arc::new(MockModelProvider::new(64));
        let config = EmbeddingConfig {
            max_text_chars: 10,
            batch_pause: Duration::ZERO,
            ..EmbeddingConfig::default()
        };
        let client = EmbeddingClient::new(provider, config);
        // Multi-byte chars must not split.
        let result = client.embed("éééééééééééééééééééé").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_embed_batch_skips_failures() {
        let provider = Arc::new(MockModelProvider::new(64).with_failure_on("poison"));
        let config = EmbeddingConfig {
            batch_group_size: 2,
            batch_pause: Duration::ZERO,
            ..EmbeddingConfig::default()
        };
        let client = EmbeddingClient::new(provider, config);

        let texts = vec![
            "good first text".to_string(),
            "poison pill here".to_string(),
            "x".to_string(), // too short, skipped up front
            "good last text".to_string(),
        ];
        let results = client.embed_batch(&texts, None).await;

        assert!(results.contains_key(&0));
        assert!(!results.contains_key(&1));
        assert!(!results.contains_key(&2));
        assert!(results.contains_key(&3));
    }

    #[tokio::test]
    async fn test_embed_batch_uses_cache() {
        let (provider, client) = client_with_mock(64);
        let texts = vec!["repeated text here".to_string(), "repeated text here".to_string()];

        let results = client.embed_batch(&texts, None).await;
        assert_eq!(results.len(), 2);
        // Both indexes resolved, but the provider only saw one of them
        // (second was an intra-batch cache hit after the first group) or
        // both in one group; either way no more than one group call ran.
        assert!(provider.embed_call_count() <= 2);

        let again = client.embed_batch(&texts, None).await;
        assert_eq!(again.len(), 2);
        assert!(provider.embed_call_count() <= 2, "second batch fully cached");
    }

    #[tokio::test]
    async fn test_embed_batch_cancelled_keeps_partial() {
        let provider = Arc::new(MockModelProvider::new(64));
        let config = EmbeddingConfig {
            batch_group_size: 1,
            batch_pause: Duration::ZERO,
            ..EmbeddingConfig::default()
        };
        let client = EmbeddingClient::new(provider, config);

        let token = CancellationToken::new();
        token.cancel();

        let texts = vec![
            "first text".to_string(),
            "second text".to_string(),
            "third text".to_string(),
        ];
        let results = client.embed_batch(&texts, Some(&token)).await;

        // First group completes, then cancellation stops the rest.
        assert_eq!(results.len(), 1);
        assert!(results.contains_key(&0));
    }
}
