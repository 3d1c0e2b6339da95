//! Clustering engine: runs k-means over conversation embeddings, labels
//! the surviving clusters, and writes assignments and auto-tags back.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use ulid::Ulid;

use knowledge_storage::Storage;
use knowledge_types::{Cluster, Conversation};

use crate::error::ClusterError;
use crate::kmeans::{cosine_similarity, kmeans};

/// Clustering configuration.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Upper bound on cluster count
    pub max_clusters: usize,
    /// Clusters smaller than this are discarded, and runs with fewer
    /// conversations than this abort
    pub min_cluster_size: usize,
    /// Iteration bound for a single k-means run
    pub max_iterations: usize,
    /// Keywords kept per cluster label
    pub label_keywords: usize,
    /// Fixed seed for reproducible runs; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_clusters: 10,
            min_cluster_size: 3,
            max_iterations: 100,
            label_keywords: 3,
            seed: None,
        }
    }
}

/// Outcome of a clustering run.
#[derive(Debug, Clone)]
pub enum ClusterOutcome {
    /// Too few embedded conversations to cluster; nothing was written.
    NotEnoughData {
        /// How many embedded conversations were available
        conversations: usize,
    },
    /// Clusters were produced and persisted.
    Completed(ClusterRunReport),
}

/// Summary of a completed clustering run.
#[derive(Debug, Clone)]
pub struct ClusterRunReport {
    /// Surviving clusters, as persisted
    pub clusters: Vec<Cluster>,
    /// Conversations assigned to a surviving cluster
    pub clustered: usize,
    /// Conversations whose cluster fell below the size floor
    pub unclustered: usize,
    /// K-means iterations until membership stabilized
    pub iterations: usize,
}

/// One entry from a similarity query.
#[derive(Debug, Clone)]
pub struct SimilarConversation {
    pub conversation_id: String,
    pub title: String,
    pub similarity: f32,
}

/// Conversation clustering service.
pub struct ClusterEngine {
    storage: Arc<Storage>,
    config: ClusterConfig,
}

impl ClusterEngine {
    pub fn new(storage: Arc<Storage>, config: ClusterConfig) -> Self {
        Self { storage, config }
    }

    /// Run a full clustering pass.
    ///
    /// The run replaces all prior clusters, conversation assignments, and
    /// auto-tags; it is never incremental. Conversations without an
    /// embedding are skipped.
    pub fn cluster_conversations(&self) -> Result<ClusterOutcome, ClusterError> {
        let candidates: Vec<Conversation> = self
            .storage
            .all_conversations()?
            .into_iter()
            .filter(|c| c.is_live() && c.embedding.is_some())
            .collect();

        if candidates.len() < self.config.min_cluster_size {
            info!(
                conversations = candidates.len(),
                minimum = self.config.min_cluster_size,
                "Not enough embedded conversations to cluster"
            );
            return Ok(ClusterOutcome::NotEnoughData {
                conversations: candidates.len(),
            });
        }

        let vectors: Vec<Vec<f32>> = candidates
            .iter()
            .map(|c| c.embedding.clone().unwrap_or_default())
            .collect();
        let k = (candidates.len() / self.config.min_cluster_size)
            .min(self.config.max_clusters)
            .max(1);

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let result = kmeans(&vectors, k, self.config.max_iterations, &mut rng);
        debug!(k = k, iterations = result.iterations, "K-means converged");

        // Group member indexes per cluster, dropping under-sized clusters
        // outright rather than reassigning their members.
        let mut members: HashMap<usize, Vec<usize>> = HashMap::new();
        for (i, cluster) in result.assignments.iter().enumerate() {
            members.entry(*cluster).or_default().push(i);
        }

        let mut clusters = Vec::new();
        let mut clustered = 0usize;
        for indexes in members.into_values() {
            if indexes.len() < self.config.min_cluster_size {
                continue;
            }
            let titles: Vec<&str> = indexes
                .iter()
                .map(|i| candidates[*i].title.as_str())
                .collect();
            let keywords = title_keywords(&titles, self.config.label_keywords);
            let label = if keywords.is_empty() {
                "unlabeled".to_string()
            } else {
                keywords.join(" ")
            };
            let member_ids: Vec<String> =
                indexes.iter().map(|i| candidates[*i].id.clone()).collect();
            clustered += member_ids.len();
            clusters.push(Cluster::new(
                Ulid::new().to_string(),
                label,
                keywords,
                member_ids,
            ));
        }

        self.persist_run(&candidates, &clusters)?;

        let report = ClusterRunReport {
            clustered,
            unclustered: candidates.len() - clustered,
            iterations: result.iterations,
            clusters,
        };
        info!(
            clusters = report.clusters.len(),
            clustered = report.clustered,
            unclustered = report.unclustered,
            "Clustering run complete"
        );
        Ok(ClusterOutcome::Completed(report))
    }

    /// Write clusters, conversation assignments, and auto-tags.
    fn persist_run(
        &self,
        candidates: &[Conversation],
        clusters: &[Cluster],
    ) -> Result<(), ClusterError> {
        self.storage.replace_clusters(clusters)?;

        let mut assignment: HashMap<&str, &Cluster> = HashMap::new();
        for cluster in clusters {
            for member in &cluster.member_ids {
                assignment.insert(member.as_str(), cluster);
            }
        }

        for conversation in candidates {
            let mut updated = conversation.clone();
            match assignment.get(conversation.id.as_str()) {
                Some(cluster) => {
                    updated.cluster_id = Some(cluster.id.clone());
                    self.storage.put_conversation(&updated)?;
                    self.storage
                        .replace_tags(&conversation.id, &cluster.keywords)?;
                }
                None => {
                    if updated.cluster_id.take().is_some() {
                        self.storage.put_conversation(&updated)?;
                    }
                    self.storage.replace_tags(&conversation.id, &[])?;
                }
            }
        }
        Ok(())
    }

    /// Conversations most similar to the given one, by embedding cosine.
    pub fn find_similar(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<SimilarConversation>, ClusterError> {
        let conversation = self
            .storage
            .get_conversation(conversation_id)?
            .ok_or_else(|| ClusterError::ConversationNotFound(conversation_id.to_string()))?;
        let reference = conversation
            .embedding
            .ok_or_else(|| ClusterError::NoEmbedding(conversation_id.to_string()))?;

        let mut ranked: Vec<SimilarConversation> = self
            .storage
            .all_conversations()?
            .into_iter()
            .filter(|c| c.is_live() && c.id != conversation_id)
            .filter_map(|c| {
                let embedding = c.embedding.as_ref()?;
                Some(SimilarConversation {
                    similarity: cosine_similarity(&reference, embedding),
                    conversation_id: c.id,
                    title: c.title,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Member conversations of the cluster with the given label.
    pub fn conversations_by_cluster(
        &self,
        label: &str,
    ) -> Result<Vec<Conversation>, ClusterError> {
        let Some(cluster) = self
            .storage
            .all_clusters()?
            .into_iter()
            .find(|c| c.label == label)
        else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        for member in &cluster.member_ids {
            match self.storage.get_conversation(member)? {
                Some(conversation) => out.push(conversation),
                None => warn!(
                    conversation_id = %member,
                    "Cluster member no longer exists"
                ),
            }
        }
        Ok(out)
    }
}

/// Most frequent significant words (longer than 3 chars) across titles,
/// ties broken alphabetically for stable labels.
fn title_keywords(titles: &[&str], limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for title in titles {
        for word in title.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if word.len() > 3 {
                *counts.entry(word).or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(w, _)| w).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_keywords_filters_short_words() {
        let titles = [
            "Fix the inventory sync",
            "Inventory audit for Q3",
            "inventory, again!",
        ];
        let keywords = title_keywords(&titles, 3);
        assert_eq!(keywords[0], "inventory");
        assert!(keywords.iter().all(|w| w.len() > 3));
    }

    #[test]
    fn test_title_keywords_stable_order() {
        let titles = ["alpha beta", "beta alpha"];
        let a = title_keywords(&titles, 2);
        let b = title_keywords(&titles, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_keywords_empty_when_all_words_short() {
        assert!(title_keywords(&["a to the", "of it"], 3).is_empty());
    }
}
