//! Conversation cluster types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A topic cluster of conversations.
///
/// Clusters are recomputed wholesale on each clustering run; a run replaces
/// every prior cluster rather than updating incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Unique identifier (ULID), fresh per run
    pub id: String,
    /// Human-readable label built from member title keywords
    pub label: String,
    /// Most frequent significant words across member titles
    pub keywords: Vec<String>,
    /// Member conversation ids
    pub member_ids: Vec<String>,
    /// When the clustering run produced this cluster
    pub created_at: DateTime<Utc>,
}

impl Cluster {
    /// Create a cluster record.
    pub fn new(id: String, label: String, keywords: Vec<String>, member_ids: Vec<String>) -> Self {
        Self {
            id,
            label,
            keywords,
            member_ids,
            created_at: Utc::now(),
        }
    }

    /// Number of member conversations.
    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }
}
