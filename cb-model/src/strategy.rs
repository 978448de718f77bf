use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Configuration;
use crate::metrics::Metrics;

/// A pluggable failure-evaluation strategy: given the current metrics and
/// the breaker's configuration, decide whether the breaker should trip
/// (transition Closed/HalfOpen → Open).
///
/// Implementations must be pure functions of `(metrics, config, now)` — no
/// internal state, no I/O. That's what lets a single `Strategy` instance be
/// shared across every breaker that names it.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn should_open(&self, metrics: &Metrics, config: &Configuration, now: i64) -> bool;
}

/// Trips once `consecutiveFailures >= failureThreshold`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsecutiveFailures;

impl Strategy for ConsecutiveFailures {
    fn name(&self) -> &'static str {
        "consecutive_failures"
    }

    fn should_open(&self, metrics: &Metrics, config: &Configuration, _now: i64) -> bool {
        metrics.consecutive_failures >= config.failure_threshold
    }
}

/// Trips once `failureRate >= percentageThreshold`, gated by
/// `minimumThroughput` — below the throughput floor the strategy never
/// trips, however bad the rate looks, to avoid overreacting to a handful of
/// early failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentageFailures;

impl Strategy for PercentageFailures {
    fn name(&self) -> &'static str {
        "percentage_failures"
    }

    fn should_open(&self, metrics: &Metrics, config: &Configuration, _now: i64) -> bool {
        metrics.has_sufficient_throughput(config.minimum_throughput)
            && metrics.failure_rate() >= config.percentage_threshold
    }
}

/// `PercentageFailures` plus a recency gate: the percentage condition must
/// additionally have been observed within `samplingDurationSecs` of `now`,
/// via `lastFailureTime`. A high failure rate built up long ago and since
/// gone quiet doesn't trip the breaker.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingWindow;

impl Strategy for RollingWindow {
    fn name(&self) -> &'static str {
        "rolling_window"
    }

    fn should_open(&self, metrics: &Metrics, config: &Configuration, now: i64) -> bool {
        if !metrics.has_sufficient_throughput(config.minimum_throughput) {
            return false;
        }
        if metrics.failure_rate() < config.percentage_threshold {
            return false;
        }
        match metrics.last_failure_time {
            Some(last) => now - last <= config.sampling_duration_secs,
            None => false,
        }
    }
}

/// A lookup of strategies by name, consulted by the breaker engine and
/// extensible by embedders registering their own implementations.
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: HashMap<&'static str, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        registry.register(Arc::new(ConsecutiveFailures));
        registry.register(Arc::new(PercentageFailures));
        registry.register(Arc::new(RollingWindow));
        registry
    }

    pub fn register(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies.insert(strategy.name(), strategy);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(name).cloned()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
