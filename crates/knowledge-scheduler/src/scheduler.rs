//! Scheduler service wrapper around tokio-cron-scheduler.
//!
//! Owns the job scheduler lifecycle, the job registry, and graceful
//! shutdown via a cancellation token shared with every registered job.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono_tz::Tz;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::jitter::with_jitter;
use crate::overlap::OverlapGuard;
use crate::registry::{JobRegistry, JobResult};
use crate::{JitterConfig, OverlapPolicy, SchedulerConfig, SchedulerError};

/// Validate a 6-field cron expression (sec min hour day month weekday).
///
/// # Example
///
/// ```
/// use knowledge_scheduler::validate_cron_expression;
///
/// assert!(validate_cron_expression("0 0 * * * *").is_ok());
/// assert!(validate_cron_expression("invalid").is_err());
/// ```
pub fn validate_cron_expression(expr: &str) -> Result<(), SchedulerError> {
    match Job::new_async(expr, |_uuid, _lock| Box::pin(async {})) {
        Ok(_) => Ok(()),
        Err(e) => Err(SchedulerError::InvalidCron(format!("'{}': {}", expr, e))),
    }
}

/// Lifecycle wrapper for background job scheduling.
///
/// Jobs are registered before `start()`; `shutdown()` cancels the shared
/// token, waits for the configured timeout, then stops the scheduler.
pub struct SchedulerService {
    scheduler: JobScheduler,
    config: SchedulerConfig,
    registry: Arc<JobRegistry>,
    shutdown_token: CancellationToken,
    is_running: AtomicBool,
}

impl SchedulerService {
    /// Create a scheduler service. Jobs do not run until `start()`.
    pub async fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        // Surface a bad default timezone at construction time.
        let _ = config.parse_timezone()?;

        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            config,
            registry: Arc::new(JobRegistry::new()),
            shutdown_token: CancellationToken::new(),
            is_running: AtomicBool::new(false),
        })
    }

    /// Start executing scheduled jobs.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.scheduler.start().await?;
        info!("Scheduler started");

        Ok(())
    }

    /// Shut down gracefully: cancel the shared token, give running jobs
    /// the configured timeout to finish, then stop the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), SchedulerError> {
        if !self.is_running.load(Ordering::SeqCst) {
            return Err(SchedulerError::NotRunning);
        }

        info!("Initiating scheduler shutdown");
        self.shutdown_token.cancel();

        tokio::time::sleep(std::time::Duration::from_secs(
            self.config.shutdown_timeout_secs.min(5),
        ))
        .await;

        if let Err(e) = self.scheduler.shutdown().await {
            warn!("Error during scheduler shutdown: {}", e);
        }

        self.is_running.store(false, Ordering::SeqCst);
        info!("Scheduler shutdown complete");

        Ok(())
    }

    /// Token cancelled when shutdown begins. Long jobs should check it
    /// between units of work.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// The registry holding status for every registered job.
    pub fn registry(&self) -> Arc<JobRegistry> {
        self.registry.clone()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Parse an IANA timezone name.
    pub fn parse_timezone(tz_str: &str) -> Result<Tz, SchedulerError> {
        tz_str
            .parse()
            .map_err(|_| SchedulerError::InvalidTimezone(tz_str.to_string()))
    }

    /// Register a job with overlap policy, jitter, and registry tracking.
    ///
    /// The job function returns `Ok(metadata)` on success (free-form
    /// stats recorded in the registry) or `Err(reason)` on failure.
    /// Runs skipped by the overlap policy are recorded as skipped;
    /// paused jobs and runs after shutdown has begun are not executed.
    ///
    /// # Arguments
    ///
    /// * `name` - Registry key and logging name
    /// * `cron_expr` - 6-field cron expression
    /// * `timezone` - IANA timezone, or `None` for the config default
    /// * `policy` - What to do when a previous run is still active
    /// * `jitter` - Random start delay to spread load
    /// * `job_fn` - Async function executed per run
    pub async fn register_job<F, Fut>(
        &self,
        name: &str,
        cron_expr: &str,
        timezone: Option<&str>,
        policy: OverlapPolicy,
        jitter: JitterConfig,
        job_fn: F,
    ) -> Result<uuid::Uuid, SchedulerError>
    where
        F: Fn() -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<HashMap<String, String>, String>> + Send,
    {
        let tz: Tz = match timezone {
            Some(tz_str) => Self::parse_timezone(tz_str)?,
            None => self.config.parse_timezone()?,
        };
        validate_cron_expression(cron_expr)?;

        self.registry.register(name, cron_expr);

        let guard = Arc::new(OverlapGuard::new(policy));
        let registry = self.registry.clone();
        let shutdown_token = self.shutdown_token.clone();
        let job_name = name.to_string();

        let job = Job::new_async_tz(cron_expr, tz, move |_uuid, _lock| {
            let name = job_name.clone();
            let registry = registry.clone();
            let guard = guard.clone();
            let token = shutdown_token.clone();
            let job_fn = job_fn.clone();

            Box::pin(async move {
                if token.is_cancelled() {
                    return;
                }
                if registry.is_paused(&name) {
                    debug!(job = %name, "Job paused, skipping run");
                    return;
                }
                let run_guard = match guard.try_acquire() {
                    Some(run_guard) => run_guard,
                    None => {
                        warn!(job = %name, "Previous run still active, skipping");
                        registry.record_complete(
                            &name,
                            JobResult::Skipped("previous run still active".to_string()),
                            0,
                            HashMap::new(),
                        );
                        return;
                    }
                };

                with_jitter(&jitter, async {
                    registry.record_start(&name);
                    info!(job = %name, "Job started");
                    let start = std::time::Instant::now();

                    let outcome = job_fn().await;

                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    match outcome {
                        Ok(metadata) => {
                            info!(job = %name, duration_ms = elapsed_ms, "Job completed");
                            registry.record_complete(
                                &name,
                                JobResult::Success,
                                elapsed_ms,
                                metadata,
                            );
                        }
                        Err(reason) => {
                            error!(job = %name, duration_ms = elapsed_ms, error = %reason, "Job failed");
                            registry.record_complete(
                                &name,
                                JobResult::Failed(reason),
                                elapsed_ms,
                                HashMap::new(),
                            );
                        }
                    }
                })
                .await;
                drop(run_guard);
            })
        })
        .map_err(|e| SchedulerError::InvalidCron(e.to_string()))?;

        let uuid = self.scheduler.add(job).await?;
        info!(job = %name, uuid = %uuid, cron = %cron_expr, timezone = %tz.name(), "Job registered");

        Ok(uuid)
    }
}
