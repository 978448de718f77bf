use async_trait::async_trait;
use cb_errors::StoreError;
use cb_model::{CircuitState, HealthStatus, Identity, Record, Store};
use dashmap::DashMap;

/// In-process driver backed by a `DashMap` keyed on the identity's
/// canonical string form. No expiry, no cross-process sharing — state is
/// lost on restart, which is the point: it's the zero-dependency default.
pub struct MemoryStore {
    records: DashMap<String, Record>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    fn key(identity: &Identity) -> String {
        identity.canonical_key(None, "record")
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_or_create(&self, identity: &Identity, now: i64) -> Result<Record, StoreError> {
        let key = Self::key(identity);
        let record = *self
            .records
            .entry(key)
            .or_insert_with(|| Record::new_closed(now));
        Ok(record)
    }

    async fn record_success(&self, identity: &Identity, now: i64) -> Result<Record, StoreError> {
        let key = Self::key(identity);
        let mut entry = self
            .records
            .entry(key)
            .or_insert_with(|| Record::new_closed(now));
        entry.metrics = entry.metrics.with_success(now);
        Ok(*entry)
    }

    async fn record_failure(&self, identity: &Identity, now: i64) -> Result<Record, StoreError> {
        let key = Self::key(identity);
        let mut entry = self
            .records
            .entry(key)
            .or_insert_with(|| Record::new_closed(now));
        entry.metrics = entry.metrics.with_failure(now);
        Ok(*entry)
    }

    async fn transition(&self, identity: &Identity, state: CircuitState, now: i64) -> Result<Record, StoreError> {
        let key = Self::key(identity);
        let mut entry = self
            .records
            .entry(key)
            .or_insert_with(|| Record::new_closed(now));
        entry.state = state;
        entry.transitioned_at = now;
        entry.metrics = entry.metrics.with_consecutive_reset();
        Ok(*entry)
    }

    async fn reset(&self, identity: &Identity, now: i64) -> Result<Record, StoreError> {
        let key = Self::key(identity);
        let fresh = Record::new_closed(now);
        self.records.insert(key, fresh);
        Ok(fresh)
    }

    async fn flush(&self) -> Result<(), StoreError> {
        self.records.clear();
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus::healthy(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_model::Scope;

    fn id(name: &str) -> Identity {
        Identity::new(name, Scope::global())
    }

    #[tokio::test]
    async fn find_or_create_initializes_closed() {
        let store = MemoryStore::new();
        let record = store.find_or_create(&id("svc"), 100).await.unwrap();
        assert_eq!(record.state, CircuitState::Closed);
        assert_eq!(record.metrics.total_successes, 0);
    }

    #[tokio::test]
    async fn record_success_and_failure_accumulate() {
        let store = MemoryStore::new();
        store.record_success(&id("svc"), 1).await.unwrap();
        let r = store.record_failure(&id("svc"), 2).await.unwrap();
        assert_eq!(r.metrics.total_successes, 1);
        assert_eq!(r.metrics.total_failures, 1);
        assert_eq!(r.metrics.consecutive_failures, 1);
    }

    #[tokio::test]
    async fn transition_to_open_zeroes_consecutive_counters_but_preserves_totals() {
        let store = MemoryStore::new();
        store.record_failure(&id("svc"), 1).await.unwrap();
        store.record_failure(&id("svc"), 2).await.unwrap();
        let r = store.transition(&id("svc"), CircuitState::Open, 3).await.unwrap();
        assert_eq!(r.state, CircuitState::Open);
        assert_eq!(r.metrics.consecutive_failures, 0);
        assert_eq!(r.metrics.total_failures, 2);
    }

    #[tokio::test]
    async fn reset_zeroes_everything() {
        let store = MemoryStore::new();
        store.record_failure(&id("svc"), 1).await.unwrap();
        let r = store.reset(&id("svc"), 5).await.unwrap();
        assert_eq!(r.metrics.total_failures, 0);
        assert_eq!(r.state, CircuitState::Closed);
        assert_eq!(r.transitioned_at, 5);
    }

    #[tokio::test]
    async fn distinct_identities_are_independent() {
        let store = MemoryStore::new();
        store.record_failure(&id("a"), 1).await.unwrap();
        let b = store.find_or_create(&id("b"), 1).await.unwrap();
        assert_eq!(b.metrics.total_failures, 0);
    }

    #[tokio::test]
    async fn flush_clears_all_records() {
        let store = MemoryStore::new();
        store.record_failure(&id("svc"), 1).await.unwrap();
        store.flush().await.unwrap();
        let r = store.find_or_create(&id("svc"), 2).await.unwrap();
        assert_eq!(r.metrics.total_failures, 0);
    }

    #[tokio::test]
    async fn health_check_is_always_healthy() {
        let store = MemoryStore::new();
        assert!(store.health_check().await.healthy);
    }
}
