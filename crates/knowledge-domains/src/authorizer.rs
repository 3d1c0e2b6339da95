//! God-mode authorization seam.
//!
//! The original access layer flipped god mode with no check at all. Here
//! the decision is delegated to an injected authorizer, and the default
//! denies everything: an operator must wire an explicit policy to make
//! god mode reachable.

use chrono::{Duration, Utc};
use std::collections::HashSet;

use crate::error::DomainError;
use crate::scope::GodModeGrant;

/// Decides whether a god-mode request becomes a grant.
pub trait GodModeAuthorizer: Send + Sync {
    /// Authorize god mode for a conversation. Returns the grant to
    /// persist, or an error explaining the denial.
    fn authorize(
        &self,
        conversation_id: &str,
        requested_by: &str,
    ) -> Result<GodModeGrant, DomainError>;
}

/// Default policy: every request is denied.
#[derive(Debug, Default)]
pub struct DenyAllAuthorizer;

impl GodModeAuthorizer for DenyAllAuthorizer {
    fn authorize(
        &self,
        conversation_id: &str,
        _requested_by: &str,
    ) -> Result<GodModeGrant, DomainError> {
        Err(DomainError::NotAuthorized {
            conversation_id: conversation_id.to_string(),
            reason: "no god-mode policy configured".to_string(),
        })
    }
}

/// Policy granting time-limited god mode to a fixed set of identities.
#[derive(Debug)]
pub struct AllowListAuthorizer {
    allowed: HashSet<String>,
    grant_duration: Duration,
}

impl AllowListAuthorizer {
    /// Create a policy allowing the given identities, with each grant
    /// lapsing after `grant_duration`.
    pub fn new<I, S>(allowed: I, grant_duration: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            grant_duration,
        }
    }
}

impl GodModeAuthorizer for AllowListAuthorizer {
    fn authorize(
        &self,
        conversation_id: &str,
        requested_by: &str,
    ) -> Result<GodModeGrant, DomainError> {
        if !self.allowed.contains(requested_by) {
            return Err(DomainError::NotAuthorized {
                conversation_id: conversation_id.to_string(),
                reason: format!("'{}' is not on the god-mode allow list", requested_by),
            });
        }
        let now = Utc::now();
        Ok(GodModeGrant {
            granted_by: requested_by.to_string(),
            granted_at: now,
            expires_at: Some(now + self.grant_duration),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deny_all_denies() {
        let err = DenyAllAuthorizer.authorize("conv1", "anyone").unwrap_err();
        assert!(matches!(err, DomainError::NotAuthorized { .. }));
    }

    #[test]
    fn test_allow_list_grants_with_expiry() {
        let authorizer = AllowListAuthorizer::new(["ops"], Duration::hours(1));

        let grant = authorizer.authorize("conv1", "ops").unwrap();
        assert_eq!(grant.granted_by, "ops");
        assert!(grant.expires_at.is_some());
        assert!(grant.is_active(Utc::now()));

        assert!(authorizer.authorize("conv1", "intruder").is_err());
    }
}
