//! # knowledge-scheduler
//!
//! Cron-driven background jobs for the knowledge subsystem: clustering,
//! importance scoring and pruning, conversation compression, and retry
//! of pending chunk embeddings.
//!
//! Built on `tokio-cron-scheduler` with timezone-aware schedules,
//! skip-if-running overlap protection, random start jitter, and graceful
//! shutdown via a shared `CancellationToken`. Every job reports its runs
//! to a [`JobRegistry`] for observability.
//!
//! # Example
//!
//! ```ignore
//! use knowledge_scheduler::{
//!     JitterConfig, OverlapPolicy, SchedulerConfig, SchedulerService,
//! };
//!
//! let scheduler = SchedulerService::new(SchedulerConfig::default()).await?;
//!
//! scheduler.register_job(
//!     "nightly-sweep",
//!     "0 0 3 * * *",
//!     None,
//!     OverlapPolicy::Skip,
//!     JitterConfig::new(300),
//!     || async { do_sweep().await },
//! ).await?;
//!
//! scheduler.start().await?;
//! ```

mod config;
mod error;
mod jitter;
mod overlap;
mod registry;
mod scheduler;

#[cfg(feature = "jobs")]
pub mod jobs;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use jitter::{with_jitter, JitterConfig};
pub use overlap::{OverlapGuard, OverlapPolicy, RunGuard};
pub use registry::{JobRegistry, JobResult, JobStatus};
pub use scheduler::{validate_cron_expression, SchedulerService};
