//! Importance scorer: combines the five factors into a persisted [1, 10]
//! composite, and prunes conversations that decayed below the floor.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use knowledge_storage::Storage;
use knowledge_types::{Conversation, ConversationSource, ScoreBreakdown};

use crate::error::ScoringError;
use crate::factors;

/// Relative weight of each factor; must sum to 1.0.
#[derive(Debug, Clone)]
pub struct ScoreWeights {
    pub recency: f64,
    pub engagement: f64,
    pub uniqueness: f64,
    pub context_relevance: f64,
    pub depth: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            recency: 0.45,
            engagement: 0.15,
            uniqueness: 0.10,
            context_relevance: 0.15,
            depth: 0.15,
        }
    }
}

/// Scoring configuration.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Recency half-life in days
    pub half_life_days: f64,
    /// Factor weights
    pub weights: ScoreWeights,
    /// Rolling window for the context-relevance factor
    pub context_window_days: f64,
    /// Jaccard threshold for title similarity
    pub title_similarity_threshold: f64,
    /// Conversations scoring below this are prune candidates
    pub prune_threshold: f64,
    /// Conversations younger than this are never pruned
    pub prune_min_age_days: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            half_life_days: 7.0,
            weights: ScoreWeights::default(),
            context_window_days: 7.0,
            title_similarity_threshold: 0.5,
            prune_threshold: 3.0,
            prune_min_age_days: 30.0,
        }
    }
}

/// Conversation importance scoring service.
pub struct ImportanceScorer {
    storage: Arc<Storage>,
    config: ScoringConfig,
}

impl ImportanceScorer {
    pub fn new(storage: Arc<Storage>, config: ScoringConfig) -> Self {
        Self { storage, config }
    }

    /// Score one conversation, persisting the breakdown and the composite
    /// on the conversation row. Unknown ids return `None`.
    pub fn score_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<f64>, ScoringError> {
        let Some(conversation) = self.storage.get_conversation(conversation_id)? else {
            return Ok(None);
        };
        let peers = self.storage.all_conversations()?;
        let breakdown = self.compute(&conversation, &peers)?;
        let total = breakdown.total;

        self.storage.put_score(&breakdown)?;
        let mut updated = conversation;
        updated.importance_score = Some(total);
        self.storage.put_conversation(&updated)?;

        debug!(conversation_id = %conversation_id, score = total, "Scored conversation");
        Ok(Some(total))
    }

    /// Score every live conversation, returning `id -> composite`.
    pub fn score_all(&self) -> Result<HashMap<String, f64>, ScoringError> {
        let peers = self.storage.all_conversations()?;
        let mut scores = HashMap::new();

        for conversation in peers.iter().filter(|c| c.is_live()) {
            let breakdown = self.compute(conversation, &peers)?;
            let total = breakdown.total;
            self.storage.put_score(&breakdown)?;

            let mut updated = conversation.clone();
            updated.importance_score = Some(total);
            self.storage.put_conversation(&updated)?;
            scores.insert(conversation.id.clone(), total);
        }

        info!(scored = scores.len(), "Scored all conversations");
        Ok(scores)
    }

    /// The `limit` highest-scoring live conversations, best first.
    /// Unscored conversations rank last.
    pub fn top_conversations(&self, limit: usize) -> Result<Vec<Conversation>, ScoringError> {
        let mut live: Vec<Conversation> = self
            .storage
            .all_conversations()?
            .into_iter()
            .filter(|c| c.is_live())
            .collect();
        live.sort_by(|a, b| {
            b.importance_score
                .unwrap_or(0.0)
                .partial_cmp(&a.importance_score.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        live.truncate(limit);
        Ok(live)
    }

    /// Live conversations eligible for pruning: scored below the
    /// threshold, older than the age floor, and not favorited.
    pub fn low_value_conversations(&self) -> Result<Vec<Conversation>, ScoringError> {
        let now = Utc::now();
        Ok(self
            .storage
            .all_conversations()?
            .into_iter()
            .filter(|c| c.is_live() && !c.favorited)
            .filter(|c| c.age_days(now) > self.config.prune_min_age_days)
            .filter(|c| {
                c.importance_score
                    .is_some_and(|s| s < self.config.prune_threshold)
            })
            .collect())
    }

    /// Prune low-value conversations. Soft pruning marks a deletion
    /// timestamp and is recoverable; hard pruning removes the
    /// conversation, its messages, tags, and score irreversibly.
    pub fn prune_conversations(&self, hard_delete: bool) -> Result<usize, ScoringError> {
        let candidates = self.low_value_conversations()?;
        let count = candidates.len();

        for conversation in candidates {
            if hard_delete {
                self.storage.delete_conversation_hard(&conversation.id)?;
            } else {
                let mut updated = conversation;
                updated.deleted_at = Some(Utc::now());
                self.storage.put_conversation(&updated)?;
            }
        }

        info!(pruned = count, hard = hard_delete, "Pruned low-value conversations");
        Ok(count)
    }

    fn compute(
        &self,
        conversation: &Conversation,
        peers: &[Conversation],
    ) -> Result<ScoreBreakdown, ScoringError> {
        let now = Utc::now();
        let messages = self.storage.messages_for_conversation(&conversation.id)?;
        let tags = self.storage.tags_for_conversation(&conversation.id)?;

        let recent = messages
            .iter()
            .filter(|m| m.age_days(now) <= self.config.context_window_days)
            .count();
        let similar = peers
            .iter()
            .filter(|p| p.id != conversation.id && p.is_live())
            .filter(|p| {
                factors::titles_similar(
                    &conversation.title,
                    &p.title,
                    self.config.title_similarity_threshold,
                )
            })
            .count();

        let recency = factors::recency(conversation.age_days(now), self.config.half_life_days);
        let engagement = factors::engagement(
            conversation.favorited,
            tags.len(),
            conversation.source == ConversationSource::User,
        );
        let uniqueness = factors::uniqueness(similar);
        let context_relevance = factors::context_relevance(recent);
        let depth = factors::depth(messages.len());

        let w = &self.config.weights;
        let total = (recency * w.recency
            + engagement * w.engagement
            + uniqueness * w.uniqueness
            + context_relevance * w.context_relevance
            + depth * w.depth)
            .clamp(1.0, 10.0);

        Ok(ScoreBreakdown {
            conversation_id: conversation.id.clone(),
            recency,
            engagement,
            uniqueness,
            context_relevance,
            depth,
            total,
            scored_at: now,
        })
    }
}
