//! Periodic job definitions for the knowledge subsystem.
//!
//! Each module pairs a serializable job config (cron schedule, timezone,
//! jitter) with a `create_*_job` registration function. All jobs use
//! `OverlapPolicy::Skip` so a slow run is never doubled up.

pub mod clustering;
pub mod compression;
pub mod embedding_retry;
pub mod scoring;

pub use clustering::{create_clustering_job, ClusteringJobConfig};
pub use compression::{create_compression_job, CompressionJobConfig};
pub use embedding_retry::{create_embedding_retry_job, EmbeddingRetryJobConfig};
pub use scoring::{create_scoring_jobs, ScoringJobConfig};
