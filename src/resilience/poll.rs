//! Bounded polling for external readiness.
//!
//! Probes `max_attempts` times in total: once immediately, then with a fixed
//! `interval` between probes. Exhaustion yields `None`, never an error, so the
//! caller decides what "not ready" means.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::DiscoveryConfig;

/// Fixed-interval, bounded retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedPoll {
    pub interval: Duration,
    /// Total probes, including the immediate one.
    pub max_attempts: u32,
}

impl BoundedPoll {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Longest time `run` can wait before giving up.
    pub fn window(&self) -> Duration {
        self.interval
            .saturating_mul(self.max_attempts.saturating_sub(1))
    }

    /// Run `probe` until it yields `Some` or the attempts are exhausted.
    pub async fn run<T, F, Fut>(&self, mut probe: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        for attempt in 1..=self.max_attempts.max(1) {
            if attempt > 1 {
                sleep(self.interval).await;
            }
            if let Some(found) = probe().await {
                tracing::debug!(attempt, "Poll satisfied");
                return Some(found);
            }
        }

        tracing::debug!(
            attempts = self.max_attempts,
            interval_ms = self.interval.as_millis() as u64,
            "Poll exhausted"
        );
        None
    }
}

impl From<&DiscoveryConfig> for BoundedPoll {
    fn from(config: &DiscoveryConfig) -> Self {
        Self::new(
            Duration::from_millis(config.poll_interval_ms),
            config.max_attempts,
        )
    }
}
