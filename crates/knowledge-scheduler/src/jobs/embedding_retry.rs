//! Periodic retry of pending chunk embeddings.
//!
//! Chunks whose embedding failed at ingest are persisted but excluded
//! from vector search. This job re-embeds them so transient provider
//! outages heal without operator action.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use knowledge_store::KnowledgeStore;

use crate::{JitterConfig, OverlapPolicy, SchedulerError, SchedulerService};

/// Schedule for the embedding retry job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRetryJobConfig {
    /// Cron expression (default: "0 15 * * * *" = quarter past every hour)
    pub cron: String,

    /// Timezone for scheduling (default: "UTC")
    pub timezone: String,

    /// Max jitter in seconds (default: 60)
    pub jitter_secs: u64,
}

impl Default for EmbeddingRetryJobConfig {
    fn default() -> Self {
        Self {
            cron: "0 15 * * * *".to_string(),
            timezone: "UTC".to_string(),
            jitter_secs: 60,
        }
    }
}

/// Register the embedding retry job with the scheduler.
pub async fn create_embedding_retry_job(
    scheduler: &SchedulerService,
    store: Arc<KnowledgeStore>,
    config: EmbeddingRetryJobConfig,
) -> Result<(), SchedulerError> {
    scheduler
        .register_job(
            "knowledge_embedding_retry",
            &config.cron,
            Some(&config.timezone),
            OverlapPolicy::Skip,
            JitterConfig::new(config.jitter_secs),
            move || {
                let store = store.clone();
                async move {
                    let embedded = store
                        .retry_pending_embeddings()
                        .await
                        .map_err(|e| e.to_string())?;
                    if embedded > 0 {
                        info!(embedded, "Pending embeddings retried");
                    }
                    Ok(HashMap::from([(
                        "embedded".to_string(),
                        embedded.to_string(),
                    )]))
                }
            },
        )
        .await?;

    info!("Registered embedding retry job");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchedulerConfig;
    use knowledge_embeddings::{EmbeddingClient, EmbeddingConfig, MockModelProvider};
    use knowledge_storage::Storage;
    use knowledge_store::StoreConfig;
    use knowledge_vector::FlatIndex;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = EmbeddingRetryJobConfig::default();
        assert_eq!(config.cron, "0 15 * * * *");
        assert_eq!(config.jitter_secs, 60);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_job_registration() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(temp.path()).unwrap());
        let embeddings = Arc::new(EmbeddingClient::new(
            Arc::new(MockModelProvider::new(64)),
            EmbeddingConfig::default(),
        ));
        let store = Arc::new(KnowledgeStore::new(
            storage,
            embeddings,
            Box::new(FlatIndex::new(64)),
            StoreConfig::default(),
        ));
        let scheduler = SchedulerService::new(SchedulerConfig::default())
            .await
            .unwrap();

        create_embedding_retry_job(&scheduler, store, EmbeddingRetryJobConfig::default())
            .await
            .unwrap();

        assert!(scheduler
            .registry()
            .is_registered("knowledge_embedding_retry"));
    }
}
