//! Knowledge domain types.
//!
//! Domains are named access scopes restricting which documents a
//! conversation may retrieve. The set is fixed at setup time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of knowledge domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeDomain {
    /// Visible to every conversation
    Global,
    /// Internal staff material
    Staff,
    /// Web-sourced content
    Web,
    /// Model-generated content
    Gpt,
    /// Wiki articles
    Wiki,
    /// Administrative material
    Superadmin,
}

impl KnowledgeDomain {
    /// Short code used in storage keys.
    pub fn code(&self) -> &'static str {
        match self {
            KnowledgeDomain::Global => "global",
            KnowledgeDomain::Staff => "staff",
            KnowledgeDomain::Web => "web",
            KnowledgeDomain::Gpt => "gpt",
            KnowledgeDomain::Wiki => "wiki",
            KnowledgeDomain::Superadmin => "superadmin",
        }
    }

    /// Parse from code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "global" => Some(KnowledgeDomain::Global),
            "staff" => Some(KnowledgeDomain::Staff),
            "web" => Some(KnowledgeDomain::Web),
            "gpt" => Some(KnowledgeDomain::Gpt),
            "wiki" => Some(KnowledgeDomain::Wiki),
            "superadmin" => Some(KnowledgeDomain::Superadmin),
            _ => None,
        }
    }

    /// All domains, in registry order.
    pub fn all() -> &'static [KnowledgeDomain] {
        &[
            KnowledgeDomain::Global,
            KnowledgeDomain::Staff,
            KnowledgeDomain::Web,
            KnowledgeDomain::Gpt,
            KnowledgeDomain::Wiki,
            KnowledgeDomain::Superadmin,
        ]
    }
}

impl std::fmt::Display for KnowledgeDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Registry entry for a domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Which domain this entry configures
    pub domain: KnowledgeDomain,
    /// Display name
    pub name: String,
    /// Inactive domains reject `switch_domain`
    pub active: bool,
}

impl DomainRecord {
    /// Create an active registry entry.
    pub fn new(domain: KnowledgeDomain, name: impl Into<String>) -> Self {
        Self {
            domain,
            name: name.into(),
            active: true,
        }
    }
}

/// Mapping of a document into a domain, with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDomainMap {
    /// Mapped document id
    pub document_id: String,
    /// Target domain
    pub domain: KnowledgeDomain,
    /// Relevance of the document within the domain, clamped to [0, 1]
    pub relevance: f32,
    /// When the mapping was created
    pub created_at: DateTime<Utc>,
}

impl DocumentDomainMap {
    /// Create a new mapping, clamping relevance into [0, 1].
    pub fn new(document_id: String, domain: KnowledgeDomain, relevance: f32) -> Self {
        Self {
            document_id,
            domain,
            relevance: relevance.clamp(0.0, 1.0),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_codes_round_trip() {
        for domain in KnowledgeDomain::all() {
            assert_eq!(KnowledgeDomain::from_code(domain.code()), Some(*domain));
        }
        assert_eq!(KnowledgeDomain::from_code("nope"), None);
    }

    #[test]
    fn test_mapping_clamps_relevance() {
        let map = DocumentDomainMap::new("d1".to_string(), KnowledgeDomain::Wiki, 1.7);
        assert_eq!(map.relevance, 1.0);
        let map = DocumentDomainMap::new("d1".to_string(), KnowledgeDomain::Wiki, -0.2);
        assert_eq!(map.relevance, 0.0);
    }
}
