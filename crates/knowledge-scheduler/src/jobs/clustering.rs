//! Periodic conversation clustering.
//!
//! Re-runs k-means over every embedded conversation, replacing the
//! previous cluster set. Clustering reads the whole conversation table,
//! so it runs off-hours and skips overlapping runs.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use knowledge_clusters::{ClusterConfig, ClusterEngine, ClusterOutcome};
use knowledge_storage::Storage;

use crate::{JitterConfig, OverlapPolicy, SchedulerError, SchedulerService};

/// Schedule for the clustering job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringJobConfig {
    /// Cron expression (default: "0 0 2 * * *" = 2 AM daily)
    pub cron: String,

    /// Timezone for scheduling (default: "UTC")
    pub timezone: String,

    /// Max jitter in seconds (default: 300 = 5 min)
    pub jitter_secs: u64,
}

impl Default for ClusteringJobConfig {
    fn default() -> Self {
        Self {
            cron: "0 0 2 * * *".to_string(),
            timezone: "UTC".to_string(),
            jitter_secs: 300,
        }
    }
}

/// Register the clustering job with the scheduler.
pub async fn create_clustering_job(
    scheduler: &SchedulerService,
    storage: Arc<Storage>,
    cluster_config: ClusterConfig,
    config: ClusteringJobConfig,
) -> Result<(), SchedulerError> {
    scheduler
        .register_job(
            "knowledge_clustering",
            &config.cron,
            Some(&config.timezone),
            OverlapPolicy::Skip,
            JitterConfig::new(config.jitter_secs),
            move || {
                let storage = storage.clone();
                let cluster_config = cluster_config.clone();
                async move { run_clustering(storage, cluster_config).await }
            },
        )
        .await?;

    info!("Registered clustering job");
    Ok(())
}

async fn run_clustering(
    storage: Arc<Storage>,
    config: ClusterConfig,
) -> Result<HashMap<String, String>, String> {
    // K-means over all embeddings is CPU-bound; keep it off the runtime.
    let outcome = tokio::task::spawn_blocking(move || {
        ClusterEngine::new(storage, config).cluster_conversations()
    })
    .await
    .map_err(|e| e.to_string())?
    .map_err(|e| e.to_string())?;

    let mut metadata = HashMap::new();
    match outcome {
        ClusterOutcome::NotEnoughData { conversations } => {
            info!(conversations, "Clustering skipped, not enough data");
            metadata.insert("skipped".to_string(), "not enough data".to_string());
            metadata.insert("conversations".to_string(), conversations.to_string());
        }
        ClusterOutcome::Completed(report) => {
            info!(
                clusters = report.clusters.len(),
                clustered = report.clustered,
                unclustered = report.unclustered,
                "Clustering run complete"
            );
            metadata.insert("clusters".to_string(), report.clusters.len().to_string());
            metadata.insert("clustered".to_string(), report.clustered.to_string());
            metadata.insert("unclustered".to_string(), report.unclustered.to_string());
        }
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchedulerConfig;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = ClusteringJobConfig::default();
        assert_eq!(config.cron, "0 0 2 * * *");
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.jitter_secs, 300);
    }

    #[test]
    fn test_config_serialization() {
        let config = ClusteringJobConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let decoded: ClusteringJobConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.cron, decoded.cron);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_job_registration() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(temp.path()).unwrap());
        let scheduler = SchedulerService::new(SchedulerConfig::default())
            .await
            .unwrap();

        create_clustering_job(
            &scheduler,
            storage,
            ClusterConfig::default(),
            ClusteringJobConfig::default(),
        )
        .await
        .unwrap();

        assert!(scheduler.registry().is_registered("knowledge_clustering"));
    }

    #[tokio::test]
    async fn test_run_on_empty_storage_reports_skip() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(temp.path()).unwrap());

        let metadata = run_clustering(storage, ClusterConfig::default())
            .await
            .unwrap();
        assert_eq!(metadata.get("skipped").map(String::as_str), Some("not enough data"));
    }
}
