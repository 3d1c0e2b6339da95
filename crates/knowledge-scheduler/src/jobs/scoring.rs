//! Periodic importance scoring and pruning.
//!
//! Two jobs: a nightly sweep that rescores every live conversation, and
//! a weekly prune that removes low-value conversations past the age
//! floor. Pruning defaults to soft delete so mistakes are recoverable.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use knowledge_scoring::{ImportanceScorer, ScoringConfig};
use knowledge_storage::Storage;

use crate::{JitterConfig, OverlapPolicy, SchedulerError, SchedulerService};

/// Schedules for the scoring and prune jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringJobConfig {
    /// Cron expression for rescoring (default: "0 0 3 * * *" = 3 AM daily)
    pub score_cron: String,

    /// Cron expression for pruning (default: "0 30 3 * * 0" = 3:30 AM Sunday)
    pub prune_cron: String,

    /// Timezone for scheduling (default: "UTC")
    pub timezone: String,

    /// Max jitter in seconds (default: 300 = 5 min)
    pub jitter_secs: u64,

    /// Hard-delete pruned conversations instead of soft delete
    pub hard_delete_prune: bool,
}

impl Default for ScoringJobConfig {
    fn default() -> Self {
        Self {
            score_cron: "0 0 3 * * *".to_string(),
            prune_cron: "0 30 3 * * 0".to_string(),
            timezone: "UTC".to_string(),
            jitter_secs: 300,
            hard_delete_prune: false,
        }
    }
}

/// Register the scoring and prune jobs with the scheduler.
pub async fn create_scoring_jobs(
    scheduler: &SchedulerService,
    storage: Arc<Storage>,
    scoring_config: ScoringConfig,
    config: ScoringJobConfig,
) -> Result<(), SchedulerError> {
    let storage_score = storage.clone();
    let scoring_score = scoring_config.clone();
    scheduler
        .register_job(
            "knowledge_scoring",
            &config.score_cron,
            Some(&config.timezone),
            OverlapPolicy::Skip,
            JitterConfig::new(config.jitter_secs),
            move || {
                let storage = storage_score.clone();
                let scoring = scoring_score.clone();
                async move { run_scoring(storage, scoring).await }
            },
        )
        .await?;

    let hard_delete = config.hard_delete_prune;
    scheduler
        .register_job(
            "knowledge_prune",
            &config.prune_cron,
            Some(&config.timezone),
            OverlapPolicy::Skip,
            JitterConfig::new(config.jitter_secs),
            move || {
                let storage = storage.clone();
                let scoring = scoring_config.clone();
                async move { run_prune(storage, scoring, hard_delete).await }
            },
        )
        .await?;

    info!("Registered scoring and prune jobs");
    Ok(())
}

async fn run_scoring(
    storage: Arc<Storage>,
    config: ScoringConfig,
) -> Result<HashMap<String, String>, String> {
    let scores = tokio::task::spawn_blocking(move || {
        ImportanceScorer::new(storage, config).score_all()
    })
    .await
    .map_err(|e| e.to_string())?
    .map_err(|e| e.to_string())?;

    info!(scored = scores.len(), "Scoring sweep complete");
    Ok(HashMap::from([(
        "scored".to_string(),
        scores.len().to_string(),
    )]))
}

async fn run_prune(
    storage: Arc<Storage>,
    config: ScoringConfig,
    hard_delete: bool,
) -> Result<HashMap<String, String>, String> {
    let pruned = tokio::task::spawn_blocking(move || {
        ImportanceScorer::new(storage, config).prune_conversations(hard_delete)
    })
    .await
    .map_err(|e| e.to_string())?
    .map_err(|e| e.to_string())?;

    info!(pruned, hard_delete, "Prune sweep complete");
    Ok(HashMap::from([
        ("pruned".to_string(), pruned.to_string()),
        (
            "mode".to_string(),
            if hard_delete { "hard" } else { "soft" }.to_string(),
        ),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchedulerConfig;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = ScoringJobConfig::default();
        assert_eq!(config.score_cron, "0 0 3 * * *");
        assert_eq!(config.prune_cron, "0 30 3 * * 0");
        assert!(!config.hard_delete_prune);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_both_jobs_registered() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(temp.path()).unwrap());
        let scheduler = SchedulerService::new(SchedulerConfig::default())
            .await
            .unwrap();

        create_scoring_jobs(
            &scheduler,
            storage,
            ScoringConfig::default(),
            ScoringJobConfig::default(),
        )
        .await
        .unwrap();

        assert!(scheduler.registry().is_registered("knowledge_scoring"));
        assert!(scheduler.registry().is_registered("knowledge_prune"));
    }

    #[tokio::test]
    async fn test_run_on_empty_storage() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(temp.path()).unwrap());

        let metadata = run_scoring(storage.clone(), ScoringConfig::default())
            .await
            .unwrap();
        assert_eq!(metadata.get("scored").map(String::as_str), Some("0"));

        let metadata = run_prune(storage, ScoringConfig::default(), false)
            .await
            .unwrap();
        assert_eq!(metadata.get("pruned").map(String::as_str), Some("0"));
        assert_eq!(metadata.get("mode").map(String::as_str), Some("soft"));
    }
}
