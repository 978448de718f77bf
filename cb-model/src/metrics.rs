use serde::{Deserialize, Serialize};

/// An immutable snapshot of a breaker's counters and timestamps.
///
/// `total_successes`/`total_failures` are monotonic for the lifetime of the
/// underlying record; `consecutive_*` reset to zero on the opposite outcome.
/// Timestamps are unix-epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Metrics {
    pub consecutive_successes: u64,
    pub consecutive_failures: u64,
    pub total_successes: u64,
    pub total_failures: u64,
    pub last_success_time: Option<i64>,
    pub last_failure_time: Option<i64>,
}

impl Metrics {
    /// `totalFailures / (totalSuccesses + totalFailures) · 100`, or `0.0`
    /// when there have been no outcomes yet.
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        let total = self.total_successes + self.total_failures;
        if total == 0 {
            return 0.0;
        }
        (self.total_failures as f64 / total as f64) * 100.0
    }

    #[must_use]
    pub fn throughput(&self) -> u64 {
        self.total_successes + self.total_failures
    }

    #[must_use]
    pub fn has_sufficient_throughput(&self, minimum: u64) -> bool {
        self.throughput() >= minimum
    }

    /// Returns the counters this snapshot would have after a success
    /// recorded at `now`. Pure — callers (drivers) still own persisting it.
    #[must_use]
    pub fn with_success(&self, now: i64) -> Metrics {
        Metrics {
            consecutive_successes: self.consecutive_successes + 1,
            consecutive_failures: 0,
            total_successes: self.total_successes + 1,
            total_failures: self.total_failures,
            last_success_time: Some(now),
            last_failure_time: self.last_failure_time,
        }
    }

    /// Returns the counters this snapshot would have after a failure
    /// recorded at `now`.
    #[must_use]
    pub fn with_failure(&self, now: i64) -> Metrics {
        Metrics {
            consecutive_successes: 0,
            consecutive_failures: self.consecutive_failures + 1,
            total_successes: self.total_successes,
            total_failures: self.total_failures + 1,
            last_success_time: self.last_success_time,
            last_failure_time: Some(now),
        }
    }

    /// Zeroes only the consecutive counters — the normal-close behaviour
    /// (`transitionToClosed`), as opposed to an explicit `Reset`.
    #[must_use]
    pub fn with_consecutive_reset(&self) -> Metrics {
        Metrics {
            consecutive_successes: 0,
            consecutive_failures: 0,
            ..*self
        }
    }
}
