//! Per-conversation access scope: the active domain and any god-mode
//! grant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use knowledge_types::KnowledgeDomain;

/// A granted god-mode capability.
///
/// God mode is never a bare flag: it is a record of who granted it and
/// until when, produced by a `GodModeAuthorizer` and persisted on the
/// conversation's scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GodModeGrant {
    /// Identity that authorized the grant
    pub granted_by: String,
    /// When the grant was issued
    pub granted_at: DateTime<Utc>,
    /// When the grant lapses; `None` means until explicitly disabled
    pub expires_at: Option<DateTime<Utc>>,
}

impl GodModeGrant {
    /// Whether the grant is active at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => now < expiry,
            None => true,
        }
    }
}

/// A conversation's access scope.
///
/// Every conversation has exactly one active domain; conversations that
/// never switched are scoped to `Global`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationScope {
    /// Conversation this scope belongs to
    pub conversation_id: String,
    /// Active knowledge domain
    pub domain: KnowledgeDomain,
    /// Active god-mode grant, if any
    pub god_mode: Option<GodModeGrant>,
    /// Last scope change
    pub updated_at: DateTime<Utc>,
}

impl ConversationScope {
    /// Default scope for a conversation that never switched domains.
    pub fn global(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            domain: KnowledgeDomain::Global,
            god_mode: None,
            updated_at: Utc::now(),
        }
    }

    /// Whether god mode is active at `now`.
    pub fn god_mode_active(&self, now: DateTime<Utc>) -> bool {
        self.god_mode.as_ref().is_some_and(|g| g.is_active(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_default_scope_is_global_without_god_mode() {
        let scope = ConversationScope::global("conv1");
        assert_eq!(scope.domain, KnowledgeDomain::Global);
        assert!(!scope.god_mode_active(Utc::now()));
    }

    #[test]
    fn test_grant_expiry() {
        let now = Utc::now();
        let grant = GodModeGrant {
            granted_by: "ops".to_string(),
            granted_at: now,
            expires_at: Some(now + Duration::hours(1)),
        };
        assert!(grant.is_active(now));
        assert!(!grant.is_active(now + Duration::hours(2)));

        let open_ended = GodModeGrant {
            granted_by: "ops".to_string(),
            granted_at: now,
            expires_at: None,
        };
        assert!(open_ended.is_active(now + Duration::days(365)));
    }
}
