//! Window summarization seam.
//!
//! Medium-tier windows collapse into one synthetic message whose text
//! comes from a `WindowSummarizer`. The provider-backed implementation
//! asks the completion model; the heuristic one works offline from first
//! sentences and is the fallback when no provider is configured.

use async_trait::async_trait;
use std::sync::Arc;

use knowledge_embeddings::{ChatMessage, ModelProvider};
use knowledge_types::Message;

use crate::error::CompressionError;

/// Produces the text of a window summary message.
#[async_trait]
pub trait WindowSummarizer: Send + Sync {
    async fn summarize(&self, messages: &[Message]) -> Result<String, CompressionError>;
}

/// First sentence of a text, capped near `max` characters.
pub(crate) fn lead_sentence(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| matches!(c, '.' | '!' | '?'))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(trimmed.len());

    if end <= max {
        return trimmed[..end].to_string();
    }
    let mut cut = max.min(trimmed.len());
    while cut > 0 && !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = trimmed[..cut].trim_end().to_string();
    out.push('…');
    out
}

/// Offline summarizer: one lead sentence per message, joined.
#[derive(Debug, Default)]
pub struct HeuristicSummarizer;

#[async_trait]
impl WindowSummarizer for HeuristicSummarizer {
    async fn summarize(&self, messages: &[Message]) -> Result<String, CompressionError> {
        let lines: Vec<String> = messages
            .iter()
            .map(|m| format!("{}: {}", m.role, lead_sentence(&m.content, 100)))
            .collect();
        Ok(format!(
            "[Summary of {} messages] {}",
            messages.len(),
            lines.join(" | ")
        ))
    }
}

/// Summarizer backed by the completion provider.
pub struct ProviderSummarizer {
    provider: Arc<dyn ModelProvider>,
}

impl ProviderSummarizer {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl WindowSummarizer for ProviderSummarizer {
    async fn summarize(&self, messages: &[Message]) -> Result<String, CompressionError> {
        let transcript: Vec<String> = messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect();
        let request = vec![
            ChatMessage {
                role: "system".to_string(),
                content: "Condense the following conversation excerpt into one \
                          short paragraph preserving decisions, facts, and open items."
                    .to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: transcript.join("\n"),
            },
        ];

        let completion = self
            .provider
            .chat_complete(&request)
            .await
            .map_err(|e| CompressionError::Summarizer(e.to_string()))?;
        if completion.text.trim().is_empty() {
            return Err(CompressionError::Summarizer(
                "provider returned an empty summary".to_string(),
            ));
        }
        Ok(completion.text)
    }
}
