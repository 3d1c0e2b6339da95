//! Tiered conversation compression.
//!
//! Messages are classified by age into four tiers. Recent messages stay
//! verbatim, medium windows collapse into summaries, old messages fold
//! into one deduplicated key-facts message, and ancient messages move to
//! the archive store. The rewrite commits as a single atomic swap:
//! originals are backed up, active history replaced, and ancient messages
//! archived in one storage batch, so a failure anywhere before the commit
//! leaves the conversation untouched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use ulid::Ulid;

use knowledge_storage::Storage;
use knowledge_types::{
    CompressionRecord, CompressionTier, Message, MessageMetadata, MessageRole, SyntheticKind,
    TierBreakdown,
};

use crate::error::CompressionError;
use crate::summarizer::{lead_sentence, WindowSummarizer};

/// Compression configuration.
#[derive(Debug, Clone)]
pub struct CompressionConfig {
    /// Messages per medium-tier summary window
    pub window_size: usize,
    /// Minimum size reduction for the compressed set to be committed
    pub target_ratio: f64,
    /// Cap for a single key-fact line
    pub key_fact_chars: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            target_ratio: 0.3,
            key_fact_chars: 100,
        }
    }
}

/// Conversation compression service.
pub struct MemoryCompressor {
    storage: Arc<Storage>,
    summarizer: Arc<dyn WindowSummarizer>,
    config: CompressionConfig,
}

impl MemoryCompressor {
    pub fn new(
        storage: Arc<Storage>,
        summarizer: Arc<dyn WindowSummarizer>,
        config: CompressionConfig,
    ) -> Self {
        Self {
            storage,
            summarizer,
            config,
        }
    }

    /// Compress one conversation. Unknown ids return `None`.
    ///
    /// The record reports per-tier counts and the size reduction; when
    /// the reduction falls short of the target ratio the active history
    /// is left unmodified (the originals are still backed up) and
    /// `applied` is false.
    pub async fn compress_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<CompressionRecord>, CompressionError> {
        if self.storage.get_conversation(conversation_id)?.is_none() {
            return Ok(None);
        }
        let originals = self.storage.messages_for_conversation(conversation_id)?;
        if originals.is_empty() {
            return Ok(Some(CompressionRecord {
                conversation_id: conversation_id.to_string(),
                original_bytes: 0,
                compressed_bytes: 0,
                ratio: 0.0,
                tiers: TierBreakdown::default(),
                applied: false,
                reason: Some("no messages".to_string()),
            }));
        }

        let now = Utc::now();
        let mut tiers = TierBreakdown::default();
        let mut recent = Vec::new();
        let mut medium = Vec::new();
        let mut old = Vec::new();
        let mut ancient = Vec::new();
        for message in &originals {
            let tier = CompressionTier::from_age_days(message.age_days(now));
            tiers.record(tier);
            match tier {
                CompressionTier::Recent => recent.push(message.clone()),
                CompressionTier::Medium => medium.push(message.clone()),
                CompressionTier::Old => old.push(message.clone()),
                CompressionTier::Ancient => ancient.push(message.clone()),
            }
        }

        // Build the replacement set before touching storage; a summarizer
        // failure here aborts with the originals still in place.
        let mut replacements = Vec::new();
        replacements.extend(recent);
        for window in medium.chunks(self.config.window_size) {
            if window.len() == 1 {
                // A lone message gains nothing from summarization.
                replacements.push(window[0].clone());
            } else {
                replacements.push(self.summarize_window(conversation_id, window).await?);
            }
        }
        if let Some(facts) = self.key_facts(conversation_id, &old) {
            replacements.push(facts);
        }

        let original_bytes: usize = originals.iter().map(|m| m.content.len()).sum();
        let compressed_bytes: usize = replacements.iter().map(|m| m.content.len()).sum();
        let ratio = CompressionRecord::reduction(original_bytes, compressed_bytes);

        if ratio < self.config.target_ratio {
            // Back up without rewriting: active history is re-inserted
            // unchanged in the same batch.
            self.storage
                .swap_messages(conversation_id, &originals, &[], &originals)?;
            debug!(
                conversation_id = %conversation_id,
                ratio = ratio,
                target = self.config.target_ratio,
                "Compression skipped, reduction below target"
            );
            return Ok(Some(CompressionRecord {
                conversation_id: conversation_id.to_string(),
                original_bytes,
                compressed_bytes,
                ratio,
                tiers,
                applied: false,
                reason: Some(format!(
                    "reduction {:.2} below target {:.2}",
                    ratio, self.config.target_ratio
                )),
            }));
        }

        self.storage
            .swap_messages(conversation_id, &originals, &ancient, &replacements)?;
        info!(
            conversation_id = %conversation_id,
            original = originals.len(),
            replacement = replacements.len(),
            archived = ancient.len(),
            ratio = ratio,
            "Compressed conversation"
        );
        Ok(Some(CompressionRecord {
            conversation_id: conversation_id.to_string(),
            original_bytes,
            compressed_bytes,
            ratio,
            tiers,
            applied: true,
            reason: None,
        }))
    }

    /// Compress every live conversation, returning `id -> record`.
    /// Per-conversation failures are logged and skipped.
    pub async fn compress_all(&self) -> Result<HashMap<String, CompressionRecord>, CompressionError> {
        let mut records = HashMap::new();
        for conversation in self.storage.all_conversations()? {
            if !conversation.is_live() {
                continue;
            }
            match self.compress_conversation(&conversation.id).await {
                Ok(Some(record)) => {
                    records.insert(conversation.id, record);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        conversation_id = %conversation.id,
                        error = %e,
                        "Compression failed, conversation left intact"
                    );
                }
            }
        }
        info!(compressed = records.len(), "Compression sweep complete");
        Ok(records)
    }

    async fn summarize_window(
        &self,
        conversation_id: &str,
        window: &[Message],
    ) -> Result<Message, CompressionError> {
        let text = self.summarizer.summarize(window).await?;
        let last = &window[window.len() - 1];
        Ok(Message {
            id: Ulid::new().to_string(),
            conversation_id: conversation_id.to_string(),
            role: MessageRole::System,
            content: text,
            created_at: last.created_at,
            metadata: MessageMetadata {
                compressed: true,
                synthetic_kind: Some(SyntheticKind::Summary),
                original_count: Some(window.len() as u32),
                window_start: Some(window[0].created_at),
                window_end: Some(last.created_at),
                extra: serde_json::Value::Null,
            },
        })
    }

    /// Fold old-tier messages into one deduplicated key-facts message.
    fn key_facts(&self, conversation_id: &str, old: &[Message]) -> Option<Message> {
        if old.is_empty() {
            return None;
        }

        let mut seen = HashSet::new();
        let mut facts = Vec::new();
        for message in old {
            let fact = lead_sentence(&message.content, self.config.key_fact_chars);
            if fact.is_empty() {
                continue;
            }
            if seen.insert(fact.to_lowercase()) {
                facts.push(fact);
            }
        }

        let last = &old[old.len() - 1];
        Some(Message {
            id: Ulid::new().to_string(),
            conversation_id: conversation_id.to_string(),
            role: MessageRole::System,
            content: format!("[Key facts] {}", facts.join(" | ")),
            created_at: last.created_at,
            metadata: MessageMetadata {
                compressed: true,
                synthetic_kind: Some(SyntheticKind::KeyFacts),
                original_count: Some(old.len() as u32),
                window_start: Some(old[0].created_at),
                window_end: Some(last.created_at),
                extra: serde_json::Value::Null,
            },
        })
    }
}
