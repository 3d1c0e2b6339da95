//! External model provider trait.
//!
//! The provider serves two calls: text embedding and chat completion.
//! Implementations must be thread-safe for concurrent request handlers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

/// A chat message sent to the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", "assistant", or "tool"
    pub role: String,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// A chat completion with token usage.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Generated text
    pub text: String,
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens generated in the completion
    pub completion_tokens: u32,
}

/// Trait for the external embedding/completion provider.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Generate an embedding vector for a single text.
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Generate embeddings for a group of texts, one result per input.
    ///
    /// The default implementation calls `embed` per text so per-item
    /// failures never abort the group.
    async fn embed_many(
        &self,
        texts: &[String],
        model: &str,
    ) -> Vec<Result<Vec<f32>, EmbeddingError>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text, model).await);
        }
        out
    }

    /// Generate a chat completion.
    async fn chat_complete(&self, messages: &[ChatMessage]) -> Result<Completion, EmbeddingError>;
}
