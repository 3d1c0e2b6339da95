//! # knowledge-domains
//!
//! Domain access control over the knowledge store.
//!
//! Each conversation carries a scope: one active domain plus an optional
//! god-mode grant. Domain-aware search filters results to documents mapped
//! into the active domain (global-domain documents are always visible) and
//! ranks them by similarity weighted with the stored per-domain relevance.
//!
//! God mode bypasses domain filtering entirely, treating every document as
//! mapped at relevance 1.0. It is modeled as an explicit capability: an
//! injected `GodModeAuthorizer` issues time-bounded grants, the default
//! policy denies all requests, and every grant, denial, and domain-aware
//! query lands in the audit log.

pub mod access;
pub mod audit;
pub mod authorizer;
pub mod error;
pub mod scope;

pub use access::{DomainAccess, DomainSearchHit};
pub use audit::{AuditEntry, AuditKind};
pub use authorizer::{AllowListAuthorizer, DenyAllAuthorizer, GodModeAuthorizer};
pub use error::DomainError;
pub use scope::{ConversationScope, GodModeGrant};
