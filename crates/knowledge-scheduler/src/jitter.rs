//! Random delay before job execution.
//!
//! Jitter spreads out job start times so that several instances scheduled
//! at the same wall-clock moment do not all hit storage and the model
//! provider at once.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Jitter configuration for a registered job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct JitterConfig {
    /// Maximum jitter in seconds (0 = no jitter).
    pub max_jitter_secs: u64,
}

impl JitterConfig {
    pub fn new(max_jitter_secs: u64) -> Self {
        Self { max_jitter_secs }
    }

    /// No delay.
    pub fn none() -> Self {
        Self::default()
    }

    /// Draw a random delay in `[0, max_jitter_secs)` seconds, with
    /// millisecond granularity.
    pub fn generate_jitter(&self) -> Duration {
        if self.max_jitter_secs == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..self.max_jitter_secs * 1000))
    }

    pub fn is_enabled(&self) -> bool {
        self.max_jitter_secs > 0
    }
}

/// Run a future after a random delay drawn from `config`.
pub async fn with_jitter<F, T>(config: &JitterConfig, job_fn: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let jitter = config.generate_jitter();
    if !jitter.is_zero() {
        tracing::debug!(jitter_ms = jitter.as_millis(), "Applying jitter delay");
        tokio::time::sleep(jitter).await;
    }
    job_fn.await
}
