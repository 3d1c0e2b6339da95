//! Conversation and message types.
//!
//! Conversations are owned by the surrounding agent; this subsystem scores
//! and clusters them, and the compressor rewrites their message history
//! under an atomic backup-then-replace swap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of the message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// System prompt or notice
    System,
    /// User input
    User,
    /// Assistant response
    Assistant,
    /// Tool invocation or result
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// Kind of synthetic message produced by the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticKind {
    /// Window summary of medium-age messages
    Summary,
    /// Deduplicated key facts from old messages
    KeyFacts,
}

/// Typed metadata carried by every message.
///
/// Known fields are explicit; anything else the caller attaches survives
/// round-trips through `extra` as an opaque blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Set on synthetic messages written by the compressor
    #[serde(default)]
    pub compressed: bool,
    /// Which kind of synthetic message this is, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthetic_kind: Option<SyntheticKind>,
    /// How many original messages this synthetic message replaced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_count: Option<u32>,
    /// Timestamp of the earliest replaced message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_start: Option<DateTime<Utc>>,
    /// Timestamp of the latest replaced message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_end: Option<DateTime<Utc>>,
    /// Free-form remainder, opaque at the store boundary
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

/// A single conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier (ULID)
    pub id: String,
    /// Parent conversation id
    pub conversation_id: String,
    /// Author role
    pub role: MessageRole,
    /// Message text
    pub content: String,
    /// Creation timestamp (drives compression tiers)
    pub created_at: DateTime<Utc>,
    /// Typed metadata
    #[serde(default)]
    pub metadata: MessageMetadata,
}

impl Message {
    /// Create a plain (non-synthetic) message.
    pub fn new(
        id: String,
        conversation_id: String,
        role: MessageRole,
        content: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            conversation_id,
            role,
            content,
            created_at,
            metadata: MessageMetadata::default(),
        }
    }

    /// Age of the message in fractional days at `now`.
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        now.signed_duration_since(self.created_at).num_seconds() as f64 / 86_400.0
    }

    /// Whether this message was synthesized by the compressor.
    pub fn is_synthetic(&self) -> bool {
        self.metadata.compressed
    }
}

/// How the conversation came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationSource {
    /// Started by the user
    User,
    /// Started by an autonomous agent
    Agent,
    /// Imported from an external system
    Import,
}

/// A conversation with the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier (ULID)
    pub id: String,
    /// Title, usually derived from the first user message
    pub title: String,
    /// Centroid embedding used for clustering and similarity
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    /// Composite importance score in [1, 10] once scored
    #[serde(default)]
    pub importance_score: Option<f64>,
    /// Cluster assignment from the most recent clustering run
    #[serde(default)]
    pub cluster_id: Option<String>,
    /// Pinned by the user; boosts engagement and exempts from pruning
    #[serde(default)]
    pub favorited: bool,
    /// Origin of the conversation
    pub source: ConversationSource,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker set by pruning
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Create a new conversation with current timestamps.
    pub fn new(id: String, title: String, source: ConversationSource) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            embedding: None,
            importance_score: None,
            cluster_id: None,
            favorited: false,
            source,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Check whether the conversation is live (not soft-deleted).
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Age of the conversation in fractional days at `now`.
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        now.signed_duration_since(self.created_at).num_seconds() as f64 / 86_400.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_role_display() {
        assert_eq!(MessageRole::User.to_string(), "user");
        assert_eq!(MessageRole::Tool.to_string(), "tool");
    }

    #[test]
    fn test_message_age_days() {
        let now = Utc::now();
        let msg = Message::new(
            "m1".to_string(),
            "c1".to_string(),
            MessageRole::User,
            "hello".to_string(),
            now - Duration::hours(36),
        );
        assert!((msg.age_days(now) - 1.5).abs() < 0.001);
    }

    #[test]
    fn test_metadata_round_trip() {
        let mut meta = MessageMetadata::default();
        meta.compressed = true;
        meta.synthetic_kind = Some(SyntheticKind::Summary);
        meta.original_count = Some(5);

        let json = serde_json::to_string(&meta).unwrap();
        let decoded: MessageMetadata = serde_json::from_str(&json).unwrap();
        assert!(decoded.compressed);
        assert_eq!(decoded.synthetic_kind, Some(SyntheticKind::Summary));
        assert_eq!(decoded.original_count, Some(5));
    }

    #[test]
    fn test_metadata_missing_fields_default() {
        // Rows written before a field existed must still decode.
        let decoded: MessageMetadata = serde_json::from_str("{}").unwrap();
        assert!(!decoded.compressed);
        assert!(decoded.synthetic_kind.is_none());
        assert!(decoded.extra.is_null());
    }

    #[test]
    fn test_conversation_defaults() {
        let conv = Conversation::new(
            "c1".to_string(),
            "Inventory audit".to_string(),
            ConversationSource::User,
        );
        assert!(conv.is_live());
        assert!(conv.importance_score.is_none());
        assert!(!conv.favorited);
    }
}
