//! Domain access control over the knowledge store.
//!
//! Normal search restricts results to documents mapped into the
//! conversation's active domain (plus the global domain) and weights
//! similarity by the stored per-domain relevance. An active god-mode
//! grant treats every document as mapped at relevance 1.0.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use knowledge_store::{KnowledgeStore, SearchHit};
use knowledge_storage::{Storage, CF_CONVERSATION_SCOPES};
use knowledge_types::KnowledgeDomain;

use crate::audit::{self, AuditEntry, AuditKind};
use crate::authorizer::GodModeAuthorizer;
use crate::error::DomainError;
use crate::scope::ConversationScope;

/// One domain-aware search result.
#[derive(Debug, Clone)]
pub struct DomainSearchHit {
    /// The underlying chunk hit
    pub hit: SearchHit,
    /// Relevance of the document within the active domain (1.0 under god
    /// mode)
    pub relevance: f32,
    /// Ranking value: similarity weighted by relevance
    pub weighted: f32,
}

fn scope_key(conversation_id: &str) -> String {
    format!("scope:{}", conversation_id)
}

/// Domain access control service.
pub struct DomainAccess {
    storage: Arc<Storage>,
    store: Arc<KnowledgeStore>,
    authorizer: Box<dyn GodModeAuthorizer>,
}

impl DomainAccess {
    /// Create the service with the given god-mode policy.
    pub fn new(
        storage: Arc<Storage>,
        store: Arc<KnowledgeStore>,
        authorizer: Box<dyn GodModeAuthorizer>,
    ) -> Self {
        Self {
            storage,
            store,
            authorizer,
        }
    }

    /// The scope of a conversation; global if it never switched.
    pub fn scope(&self, conversation_id: &str) -> Result<ConversationScope, DomainError> {
        let key = scope_key(conversation_id);
        match self.storage.get(CF_CONVERSATION_SCOPES, key.as_bytes())? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)
                .map_err(knowledge_storage::StorageError::from)?),
            None => Ok(ConversationScope::global(conversation_id)),
        }
    }

    fn put_scope(&self, scope: &ConversationScope) -> Result<(), DomainError> {
        let key = scope_key(&scope.conversation_id);
        self.storage.put(
            CF_CONVERSATION_SCOPES,
            key.as_bytes(),
            &serde_json::to_vec(scope).map_err(knowledge_storage::StorageError::from)?,
        )?;
        Ok(())
    }

    /// Switch a conversation's active domain. Rejects domains marked
    /// inactive in the registry; unregistered domains are treated as
    /// active.
    pub fn switch_domain(
        &self,
        conversation_id: &str,
        domain: KnowledgeDomain,
    ) -> Result<(), DomainError> {
        if let Some(record) = self.storage.get_domain_record(domain)? {
            if !record.active {
                return Err(DomainError::InactiveDomain(domain.code().to_string()));
            }
        }

        let mut scope = self.scope(conversation_id)?;
        scope.domain = domain;
        scope.updated_at = Utc::now();
        self.put_scope(&scope)?;

        audit::append(
            &self.storage,
            &AuditEntry::new(AuditKind::DomainSwitch, conversation_id, domain)
                .with_god_mode(scope.god_mode_active(Utc::now())),
        )?;
        info!(conversation_id = %conversation_id, domain = %domain, "Switched domain");
        Ok(())
    }

    /// Request god mode for a conversation.
    ///
    /// The configured authorizer decides; both outcomes are audited. On
    /// success the grant is persisted on the conversation's scope.
    pub fn enable_god_mode(
        &self,
        conversation_id: &str,
        requested_by: &str,
    ) -> Result<(), DomainError> {
        let mut scope = self.scope(conversation_id)?;

        let grant = match self.authorizer.authorize(conversation_id, requested_by) {
            Ok(grant) => grant,
            Err(e) => {
                audit::append(
                    &self.storage,
                    &AuditEntry::new(AuditKind::GodModeDenied, conversation_id, scope.domain)
                        .with_actor(requested_by),
                )?;
                warn!(
                    conversation_id = %conversation_id,
                    requested_by = %requested_by,
                    "God mode denied"
                );
                return Err(e);
            }
        };

        scope.god_mode = Some(grant);
        scope.updated_at = Utc::now();
        self.put_scope(&scope)?;

        audit::append(
            &self.storage,
            &AuditEntry::new(AuditKind::GodModeEnabled, conversation_id, scope.domain)
                .with_god_mode(true)
                .with_actor(requested_by),
        )?;
        warn!(
            conversation_id = %conversation_id,
            granted_by = %requested_by,
            "God mode enabled"
        );
        Ok(())
    }

    /// Drop any god-mode grant from a conversation.
    pub fn disable_god_mode(&self, conversation_id: &str) -> Result<(), DomainError> {
        let mut scope = self.scope(conversation_id)?;
        if scope.god_mode.is_none() {
            return Ok(());
        }
        scope.god_mode = None;
        scope.updated_at = Utc::now();
        self.put_scope(&scope)?;

        audit::append(
            &self.storage,
            &AuditEntry::new(AuditKind::GodModeDisabled, conversation_id, scope.domain),
        )?;
        info!(conversation_id = %conversation_id, "God mode disabled");
        Ok(())
    }

    /// Whether god mode is currently active for a conversation.
    pub fn is_god_mode(&self, conversation_id: &str) -> Result<bool, DomainError> {
        Ok(self.scope(conversation_id)?.god_mode_active(Utc::now()))
    }

    /// Map a document into a domain at the given relevance.
    pub fn assign_document(
        &self,
        document_id: &str,
        domain: KnowledgeDomain,
        relevance: f32,
    ) -> Result<(), DomainError> {
        let mapping = knowledge_types::DocumentDomainMap::new(
            document_id.to_string(),
            domain,
            relevance,
        );
        self.storage.put_doc_domain(&mapping)?;
        Ok(())
    }

    /// Document ids accessible to a conversation, ranked by relevance
    /// descending. Under god mode every live document appears at 1.0.
    pub fn accessible_documents(
        &self,
        conversation_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<(String, f32)>, DomainError> {
        let scope = self.scope(conversation_id)?;

        let mut ranked: Vec<(String, f32)> = if scope.god_mode_active(Utc::now()) {
            self.store
                .storage()
                .all_documents()?
                .into_iter()
                .filter(|d| d.is_live())
                .map(|d| (d.id, 1.0))
                .collect()
        } else {
            self.relevance_map(scope.domain)?.into_iter().collect()
        };

        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }
        Ok(ranked)
    }

    /// Search restricted to the conversation's accessible documents.
    ///
    /// Results are weighted by per-domain relevance and re-ranked; the
    /// query is always audited, with the god-mode flag recorded.
    pub async fn domain_aware_search(
        &self,
        conversation_id: &str,
        query: &str,
        limit: usize,
        min_similarity: Option<f32>,
    ) -> Result<Vec<DomainSearchHit>, DomainError> {
        let scope = self.scope(conversation_id)?;
        let god_mode = scope.god_mode_active(Utc::now());

        // Over-fetch so domain filtering still fills the page.
        let candidates = self
            .store
            .search(query, limit.max(1) * 4, None, min_similarity)
            .await?;

        let relevance = if god_mode {
            None
        } else {
            Some(self.relevance_map(scope.domain)?)
        };

        let mut hits: Vec<DomainSearchHit> = candidates
            .into_iter()
            .filter_map(|hit| {
                let relevance = match &relevance {
                    None => 1.0,
                    Some(map) => *map.get(&hit.document_id)?,
                };
                let weighted = hit.similarity * relevance;
                Some(DomainSearchHit {
                    hit,
                    relevance,
                    weighted,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.weighted
                .partial_cmp(&a.weighted)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        audit::append(
            &self.storage,
            &AuditEntry::new(AuditKind::Search, conversation_id, scope.domain)
                .with_query(query, hits.len())
                .with_god_mode(god_mode),
        )?;
        Ok(hits)
    }

    /// Audit entries recorded between `start` and `end` inclusive.
    pub fn audit_entries(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        audit::entries_between(&self.storage, start, end)
    }

    /// `document id -> relevance` for a domain, including global-domain
    /// mappings visible to every conversation. A document mapped in both
    /// keeps the higher relevance.
    fn relevance_map(
        &self,
        domain: KnowledgeDomain,
    ) -> Result<HashMap<String, f32>, DomainError> {
        let mut map: HashMap<String, f32> = HashMap::new();
        for mapping in self.storage.all_doc_domains()? {
            if mapping.domain != domain && mapping.domain != KnowledgeDomain::Global {
                continue;
            }
            map.entry(mapping.document_id)
                .and_modify(|r| *r = r.max(mapping.relevance))
                .or_insert(mapping.relevance);
        }
        Ok(map)
    }
}
