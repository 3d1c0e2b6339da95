//! Periodic conversation compression.
//!
//! Sweeps every live conversation through the tiered compressor. Each
//! conversation commits independently, so a failure in one leaves the
//! rest of the sweep unaffected.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use knowledge_compression::{CompressionConfig, MemoryCompressor, WindowSummarizer};
use knowledge_storage::Storage;

use crate::{JitterConfig, OverlapPolicy, SchedulerError, SchedulerService};

/// Schedule for the compression job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionJobConfig {
    /// Cron expression (default: "0 0 4 * * *" = 4 AM daily)
    pub cron: String,

    /// Timezone for scheduling (default: "UTC")
    pub timezone: String,

    /// Max jitter in seconds (default: 300 = 5 min)
    pub jitter_secs: u64,
}

impl Default for CompressionJobConfig {
    fn default() -> Self {
        Self {
            cron: "0 0 4 * * *".to_string(),
            timezone: "UTC".to_string(),
            jitter_secs: 300,
        }
    }
}

/// Register the compression job with the scheduler.
pub async fn create_compression_job(
    scheduler: &SchedulerService,
    storage: Arc<Storage>,
    summarizer: Arc<dyn WindowSummarizer>,
    compression_config: CompressionConfig,
    config: CompressionJobConfig,
) -> Result<(), SchedulerError> {
    scheduler
        .register_job(
            "knowledge_compression",
            &config.cron,
            Some(&config.timezone),
            OverlapPolicy::Skip,
            JitterConfig::new(config.jitter_secs),
            move || {
                let storage = storage.clone();
                let summarizer = summarizer.clone();
                let compression_config = compression_config.clone();
                async move { run_compression(storage, summarizer, compression_config).await }
            },
        )
        .await?;

    info!("Registered compression job");
    Ok(())
}

async fn run_compression(
    storage: Arc<Storage>,
    summarizer: Arc<dyn WindowSummarizer>,
    config: CompressionConfig,
) -> Result<HashMap<String, String>, String> {
    let compressor = MemoryCompressor::new(storage, summarizer, config);
    let records = compressor.compress_all().await.map_err(|e| e.to_string())?;

    let applied = records.values().filter(|r| r.applied).count();
    info!(
        conversations = records.len(),
        applied, "Compression sweep complete"
    );
    Ok(HashMap::from([
        ("conversations".to_string(), records.len().to_string()),
        ("applied".to_string(), applied.to_string()),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchedulerConfig;
    use knowledge_compression::HeuristicSummarizer;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = CompressionJobConfig::default();
        assert_eq!(config.cron, "0 0 4 * * *");
        assert_eq!(config.jitter_secs, 300);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_job_registration() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(temp.path()).unwrap());
        let scheduler = SchedulerService::new(SchedulerConfig::default())
            .await
            .unwrap();

        create_compression_job(
            &scheduler,
            storage,
            Arc::new(HeuristicSummarizer),
            CompressionConfig::default(),
            CompressionJobConfig::default(),
        )
        .await
        .unwrap();

        assert!(scheduler.registry().is_registered("knowledge_compression"));
    }

    #[tokio::test]
    async fn test_run_on_empty_storage() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(temp.path()).unwrap());

        let metadata = run_compression(
            storage,
            Arc::new(HeuristicSummarizer),
            CompressionConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(metadata.get("conversations").map(String::as_str), Some("0"));
    }
}
