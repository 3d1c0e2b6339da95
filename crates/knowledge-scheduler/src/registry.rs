//! Thread-safe registry of job execution status.
//!
//! Every registered job records its runs here: last run time, duration,
//! outcome, run and error counts, plus free-form metadata reported by
//! the job itself (items clustered, conversations pruned, and so on).

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one job run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobResult {
    Success,
    /// Failed with a human-readable reason
    Failed(String),
    /// Skipped, e.g. because a previous run was still active
    Skipped(String),
}

/// Status of a registered job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_name: String,
    pub cron_expr: String,
    pub last_run: Option<DateTime<Utc>>,
    pub last_duration_ms: Option<u64>,
    pub last_result: Option<JobResult>,
    pub run_count: u64,
    pub error_count: u64,
    pub is_running: bool,
    pub is_paused: bool,
    /// Metadata reported by the last run
    #[serde(default)]
    pub last_run_metadata: HashMap<String, String>,
}

impl JobStatus {
    fn new(job_name: String, cron_expr: String) -> Self {
        Self {
            job_name,
            cron_expr,
            last_run: None,
            last_duration_ms: None,
            last_result: None,
            run_count: 0,
            error_count: 0,
            is_running: false,
            is_paused: false,
            last_run_metadata: HashMap::new(),
        }
    }
}

/// Registry of job status, shared between the scheduler and observers.
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobStatus>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a job, replacing any previous entry of the same name.
    pub fn register(&self, job_name: &str, cron_expr: &str) {
        let mut jobs = self.lock_write();
        jobs.insert(
            job_name.to_string(),
            JobStatus::new(job_name.to_string(), cron_expr.to_string()),
        );
    }

    /// Record that a run has started.
    pub fn record_start(&self, job_name: &str) {
        if let Some(status) = self.lock_write().get_mut(job_name) {
            status.is_running = true;
        }
    }

    /// Record a completed run with its outcome and reported metadata.
    ///
    /// Skipped runs count toward `run_count` but not `error_count`.
    pub fn record_complete(
        &self,
        job_name: &str,
        result: JobResult,
        duration_ms: u64,
        metadata: HashMap<String, String>,
    ) {
        if let Some(status) = self.lock_write().get_mut(job_name) {
            status.is_running = false;
            status.last_run = Some(Utc::now());
            status.last_duration_ms = Some(duration_ms);
            status.run_count += 1;
            if matches!(result, JobResult::Failed(_)) {
                status.error_count += 1;
            }
            status.last_result = Some(result);
            status.last_run_metadata = metadata;
        }
    }

    /// Pause or resume a job. Paused jobs are skipped when they fire.
    pub fn set_paused(&self, job_name: &str, paused: bool) {
        if let Some(status) = self.lock_write().get_mut(job_name) {
            status.is_paused = paused;
        }
    }

    pub fn get_status(&self, job_name: &str) -> Option<JobStatus> {
        self.lock_read().get(job_name).cloned()
    }

    pub fn get_all_status(&self) -> Vec<JobStatus> {
        self.lock_read().values().cloned().collect()
    }

    pub fn is_running(&self, job_name: &str) -> bool {
        self.lock_read()
            .get(job_name)
            .map(|s| s.is_running)
            .unwrap_or(false)
    }

    pub fn is_paused(&self, job_name: &str) -> bool {
        self.lock_read()
            .get(job_name)
            .map(|s| s.is_paused)
            .unwrap_or(false)
    }

    pub fn is_registered(&self, job_name: &str) -> bool {
        self.lock_read().contains_key(job_name)
    }

    pub fn job_count(&self) -> usize {
        self.lock_read().len()
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, JobStatus>> {
        self.jobs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, JobStatus>> {
        self.jobs.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let registry = JobRegistry::new();
        registry.register("clustering", "0 0 2 * * *");

        let status = registry.get_status("clustering").unwrap();
        assert_eq!(status.cron_expr, "0 0 2 * * *");
        assert_eq!(status.run_count, 0);
        assert!(!status.is_running);
    }

    #[test]
    fn test_record_run_lifecycle() {
        let registry = JobRegistry::new();
        registry.register("scoring", "0 0 3 * * *");

        registry.record_start("scoring");
        assert!(registry.is_running("scoring"));

        let metadata = HashMap::from([("scored".to_string(), "12".to_string())]);
        registry.record_complete("scoring", JobResult::Success, 1500, metadata);

        let status = registry.get_status("scoring").unwrap();
        assert!(!status.is_running);
        assert_eq!(status.last_duration_ms, Some(1500));
        assert_eq!(status.run_count, 1);
        assert_eq!(status.error_count, 0);
        assert_eq!(status.last_run_metadata.get("scored").unwrap(), "12");
    }

    #[test]
    fn test_failure_increments_error_count() {
        let registry = JobRegistry::new();
        registry.register("compression", "0 0 4 * * *");

        registry.record_complete(
            "compression",
            JobResult::Failed("storage unavailable".into()),
            80,
            HashMap::new(),
        );

        let status = registry.get_status("compression").unwrap();
        assert_eq!(status.run_count, 1);
        assert_eq!(status.error_count, 1);
    }

    #[test]
    fn test_skip_does_not_count_as_error() {
        let registry = JobRegistry::new();
        registry.register("compression", "0 0 4 * * *");

        registry.record_complete(
            "compression",
            JobResult::Skipped("previous run still active".into()),
            0,
            HashMap::new(),
        );

        let status = registry.get_status("compression").unwrap();
        assert_eq!(status.run_count, 1);
        assert_eq!(status.error_count, 0);
    }

    #[test]
    fn test_pause_resume() {
        let registry = JobRegistry::new();
        registry.register("clustering", "0 0 2 * * *");

        registry.set_paused("clustering", true);
        assert!(registry.is_paused("clustering"));
        registry.set_paused("clustering", false);
        assert!(!registry.is_paused("clustering"));
    }

    #[test]
    fn test_unknown_job_is_harmless() {
        let registry = JobRegistry::new();
        assert!(registry.get_status("unknown").is_none());
        assert!(!registry.is_running("unknown"));
        assert!(!registry.is_registered("unknown"));
        registry.record_start("unknown");
        registry.record_complete("unknown", JobResult::Success, 10, HashMap::new());
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(JobRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    let name = format!("job-{}", i);
                    registry.register(&name, "0 0 * * * *");
                    registry.record_start(&name);
                    registry.record_complete(&name, JobResult::Success, 5, HashMap::new());
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.job_count(), 8);
    }
}
