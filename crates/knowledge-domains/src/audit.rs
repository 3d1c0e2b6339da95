//! Access audit log.
//!
//! Every domain-aware query and every god-mode state change appends one
//! entry. Entries are keyed by timestamp so a time-ranged scan reads them
//! in order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use knowledge_storage::keys::audit_key;
use knowledge_storage::{Storage, CF_AUDIT_LOG};
use knowledge_types::KnowledgeDomain;

use crate::error::DomainError;

/// What an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// A domain-aware search ran
    Search,
    /// The conversation switched domains
    DomainSwitch,
    /// A god-mode grant was issued
    GodModeEnabled,
    /// A god-mode request was denied
    GodModeDenied,
    /// God mode was explicitly disabled
    GodModeDisabled,
}

/// One audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry id (ULID)
    pub id: String,
    /// What happened
    pub kind: AuditKind,
    /// Conversation the action applied to
    pub conversation_id: String,
    /// Active domain at the time
    pub domain: KnowledgeDomain,
    /// Query text, for search entries
    pub query: Option<String>,
    /// Result count, for search entries
    pub result_count: Option<usize>,
    /// Whether god mode was active
    pub god_mode: bool,
    /// Acting identity, for god-mode entries
    pub actor: Option<String>,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Build an entry with a fresh id and current timestamp.
    pub fn new(kind: AuditKind, conversation_id: &str, domain: KnowledgeDomain) -> Self {
        Self {
            id: Ulid::new().to_string(),
            kind,
            conversation_id: conversation_id.to_string(),
            domain,
            query: None,
            result_count: None,
            god_mode: false,
            actor: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_query(mut self, query: &str, result_count: usize) -> Self {
        self.query = Some(query.to_string());
        self.result_count = Some(result_count);
        self
    }

    pub fn with_god_mode(mut self, god_mode: bool) -> Self {
        self.god_mode = god_mode;
        self
    }

    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = Some(actor.to_string());
        self
    }
}

/// Append an entry to the audit log.
pub fn append(storage: &Storage, entry: &AuditEntry) -> Result<(), DomainError> {
    let key = audit_key(entry.created_at.timestamp_millis(), &entry.id);
    storage.put(CF_AUDIT_LOG, key.as_bytes(), &serde_json::to_vec(entry).map_err(knowledge_storage::StorageError::from)?)?;
    Ok(())
}

/// Entries written between `start` and `end` inclusive, in time order.
pub fn entries_between(
    storage: &Storage,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<AuditEntry>, DomainError> {
    let mut out = Vec::new();
    for (_, value) in storage.scan_prefix(CF_AUDIT_LOG, b"audit:")? {
        let entry: AuditEntry =
            serde_json::from_slice(&value).map_err(knowledge_storage::StorageError::from)?;
        if entry.created_at >= start && entry.created_at <= end {
            out.push(entry);
        }
    }
    Ok(out)
}
