//! Overlap policy for concurrent runs of the same job.
//!
//! When a job's scheduled time arrives while a previous run is still
//! active, the policy decides whether the new run proceeds or is skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// What to do when a job fires while a previous run is still active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OverlapPolicy {
    /// Skip the new run; the skip is recorded in the registry.
    #[default]
    Skip,

    /// Allow concurrent runs of the same job.
    Concurrent,
}

/// Hands out run guards according to the policy, tracking whether a
/// run is active through a shared flag.
pub struct OverlapGuard {
    active: Arc<AtomicBool>,
    policy: OverlapPolicy,
}

impl OverlapGuard {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            policy,
        }
    }

    /// Acquire permission to run.
    ///
    /// Under `Skip`, returns `None` while another run holds the guard.
    /// Under `Concurrent` every caller gets a guard.
    pub fn try_acquire(&self) -> Option<RunGuard> {
        match self.policy {
            OverlapPolicy::Skip => self
                .active
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
                .then(|| RunGuard {
                    flag: Some(self.active.clone()),
                }),
            OverlapPolicy::Concurrent => Some(RunGuard { flag: None }),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }
}

/// RAII guard for one run. Dropping it clears the shared flag, including
/// on panic, so a failed run never wedges the job.
///
/// Concurrent-policy guards carry no flag; there is nothing to release.
pub struct RunGuard {
    flag: Option<Arc<AtomicBool>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Some(flag) = &self.flag {
            flag.store(false, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_prevents_concurrent() {
        let guard = OverlapGuard::new(OverlapPolicy::Skip);

        let first = guard.try_acquire();
        assert!(first.is_some());
        assert!(guard.is_running());
        assert!(guard.try_acquire().is_none());

        drop(first);
        assert!(!guard.is_running());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_concurrent_allows_multiple() {
        let guard = OverlapGuard::new(OverlapPolicy::Concurrent);
        let first = guard.try_acquire();
        let second = guard.try_acquire();
        assert!(first.is_some() && second.is_some());
    }

    #[test]
    fn test_run_guard_releases_on_drop() {
        let guard = OverlapGuard::new(OverlapPolicy::Skip);
        {
            let _run = guard.try_acquire().unwrap();
            assert!(guard.is_running());
        }
        assert!(!guard.is_running());
    }

    #[test]
    fn test_default_policy_is_skip() {
        assert_eq!(OverlapPolicy::default(), OverlapPolicy::Skip);
    }
}
