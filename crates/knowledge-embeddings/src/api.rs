//! OpenAI-compatible model provider over HTTP.

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::error::EmbeddingError;
use crate::provider::{ChatMessage, Completion, ModelProvider};

/// Configuration for the API-backed provider.
#[derive(Debug, Clone)]
pub struct ApiProviderConfig {
    /// API base URL (e.g., "https://api.openai.com/v1")
    pub base_url: String,

    /// Chat model used for completions (e.g., "gpt-4o-mini")
    pub chat_model: String,

    /// API key
    pub api_key: SecretString,

    /// Request timeout
    pub timeout: Duration,

    /// Maximum retries on failure
    pub max_retries: u32,
}

impl ApiProviderConfig {
    /// Create config for the OpenAI API.
    pub fn openai(api_key: impl Into<String>, chat_model: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: chat_model.into(),
            api_key: SecretString::from(api_key.into()),
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }
}

/// OpenAI-compatible provider implementation.
pub struct ApiModelProvider {
    client: Client,
    config: ApiProviderConfig,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl ApiModelProvider {
    /// Create a new API provider.
    pub fn new(config: ApiProviderConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Run `op` with exponential backoff up to the configured retry count.
    async fn with_retries<T, F, Fut>(&self, mut op: F) -> Result<T, EmbeddingError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, EmbeddingError>>,
    {
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(120)),
            ..Default::default()
        };
        let mut attempts = 0;

        loop {
            attempts += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempts >= self.config.max_retries {
                        error!(error = %e, "Max retries exceeded");
                        return Err(e);
                    }
                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                error = %e,
                                retry_in_ms = duration.as_millis(),
                                "Provider call failed, retrying"
                            );
                            tokio::time::sleep(duration).await;
                        }
                        None => {
                            error!(error = %e, "Backoff exhausted");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    async fn request_embeddings(
        &self,
        texts: &[String],
        model: &str,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/embeddings", self.config.base_url);
        let body = EmbeddingRequest {
            model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let mut parsed: EmbeddingResponse = response.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::Provider(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }
        // The API documents index-order responses; sort to be safe.
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl ModelProvider for ApiModelProvider {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>, EmbeddingError> {
        let input = vec![text.to_string()];
        let mut vectors = self
            .with_retries(|| self.request_embeddings(&input, model))
            .await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Provider("empty embedding response".to_string()))
    }

    async fn embed_many(
        &self,
        texts: &[String],
        model: &str,
    ) -> Vec<Result<Vec<f32>, EmbeddingError>> {
        debug!(count = texts.len(), model = model, "Embedding group");
        match self
            .with_retries(|| self.request_embeddings(texts, model))
            .await
        {
            Ok(vectors) => vectors.into_iter().map(Ok).collect(),
            Err(e) => {
                // A group-level failure fails every item; the caller logs
                // and skips them without aborting the batch.
                let msg = e.to_string();
                texts
                    .iter()
                    .map(|_| Err(EmbeddingError::Provider(msg.clone())))
                    .collect()
            }
        }
    }

    async fn chat_complete(&self, messages: &[ChatMessage]) -> Result<Completion, EmbeddingError> {
        let url = format!("{}/chat/completions", self.config.base_url);

        self.with_retries(|| async {
            let body = ChatRequest {
                model: &self.config.chat_model,
                messages,
            };
            let response = self
                .client
                .post(&url)
                .bearer_auth(self.config.api_key.expose_secret())
                .json(&body)
                .send()
                .await?
                .error_for_status()?;

            let parsed: ChatResponse = response.json().await?;
            let choice = parsed
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| EmbeddingError::Provider("no completion choices".to_string()))?;
            let usage = parsed.usage.unwrap_or_default();

            Ok(Completion {
                text: choice.message.content,
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
            })
        })
        .await
    }
}
