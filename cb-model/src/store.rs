use async_trait::async_trait;
use cb_errors::StoreError;

use crate::metrics::Metrics;
use crate::scope::Identity;
use crate::state::CircuitState;

/// A snapshot of a breaker record as held by a store: the persisted state,
/// its metrics, and the timestamp of the last state transition (used to
/// evaluate whether the Open cooldown has elapsed).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub state: CircuitState,
    pub metrics: Metrics,
    pub transitioned_at: i64,
}

impl Record {
    #[must_use]
    pub fn new_closed(now: i64) -> Self {
        Self {
            state: CircuitState::Closed,
            metrics: Metrics::default(),
            transitioned_at: now,
        }
    }
}

/// Reports whether a driver is reachable, independent of any particular
/// breaker record. Grounded in the same shape every `VectorBackend`-style
/// trait in the wider ecosystem exposes for orchestration/readiness probes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthStatus {
    pub healthy: bool,
    pub latency_ms: Option<u64>,
}

impl HealthStatus {
    #[must_use]
    pub fn healthy(latency_ms: u64) -> Self {
        Self {
            healthy: true,
            latency_ms: Some(latency_ms),
        }
    }

    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            healthy: false,
            latency_ms: None,
        }
    }
}

/// Persistence contract every driver (memory, cache, durable) implements
/// identically. The engine never branches on which driver it's talking to.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetches the current record, creating one in `Closed` state at `now`
    /// if none exists yet for this identity.
    async fn find_or_create(&self, identity: &Identity, now: i64) -> Result<Record, StoreError>;

    /// Persists a success outcome and returns the updated record.
    async fn record_success(&self, identity: &Identity, now: i64) -> Result<Record, StoreError>;

    /// Persists a failure outcome (assumed already filtered by the caller's
    /// exception policy) and returns the updated record.
    async fn record_failure(&self, identity: &Identity, now: i64) -> Result<Record, StoreError>;

    /// Forces a state transition, e.g. Closed → Open on trip, Open →
    /// HalfOpen on cooldown elapsed, HalfOpen → Closed on probe success.
    /// Zeroes only the consecutive counters, never the running totals —
    /// an explicit full-zero is `reset`'s job, not this one's.
    async fn transition(&self, identity: &Identity, state: CircuitState, now: i64) -> Result<Record, StoreError>;

    /// Fully resets a breaker record to `Closed` with zeroed metrics.
    async fn reset(&self, identity: &Identity, now: i64) -> Result<Record, StoreError>;

    /// Drops all in-process caches this driver may hold. A no-op for
    /// drivers with no such cache (cache/durable); meaningful for the
    /// memory driver, where it's the only way to clear state between runs.
    async fn flush(&self) -> Result<(), StoreError>;

    async fn health_check(&self) -> HealthStatus;
}
