use async_trait::async_trait;
use cb_errors::StoreError;
use cb_model::{CircuitState, HealthStatus, Identity, Metrics, Record, Store};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const BACKEND: &str = "redis";

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct StateDoc {
    state: CircuitState,
    transitioned_at: i64,
}

/// External key-value driver, backed by a shared, cloneable
/// `redis::aio::ConnectionManager`. Two keys per identity — `…:state` and
/// `…:metrics` — each a JSON blob written with a plain `SET` (no `EX`).
/// Read-modify-write across the two keys is not transactional: a racing
/// writer can interleave between the read and the write, so the last
/// writer wins. That's tolerated by the failure model this driver serves —
/// circuit breaker state is advisory, not a source of truth that must never
/// regress.
pub struct CacheStore {
    conn: redis::aio::ConnectionManager,
}

impl CacheStore {
    #[must_use]
    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url).map_err(|e| StoreError::Connection {
            backend: BACKEND.to_string(),
            reason: e.to_string(),
        })?;
        let conn =
            redis::aio::ConnectionManager::new(client)
                .await
                .map_err(|e| StoreError::Connection {
                    backend: BACKEND.to_string(),
                    reason: e.to_string(),
                })?;
        Ok(Self::new(conn))
    }

    fn state_key(identity: &Identity) -> String {
        identity.canonical_key(Some("cb"), "state")
    }

    fn metrics_key(identity: &Identity) -> String {
        identity.canonical_key(Some("cb"), "metrics")
    }

    async fn read_state(&self, identity: &Identity) -> Result<Option<StateDoc>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(Self::state_key(identity))
            .await
            .map_err(|e| StoreError::Query {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            })?;
        raw.map(|s| serde_json::from_str(&s).map_err(|e| StoreError::Serialization(e.to_string())))
            .transpose()
    }

    async fn read_metrics(&self, identity: &Identity) -> Result<Option<Metrics>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(Self::metrics_key(identity))
            .await
            .map_err(|e| StoreError::Query {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            })?;
        raw.map(|s| serde_json::from_str(&s).map_err(|e| StoreError::Serialization(e.to_string())))
            .transpose()
    }

    async fn write_state(&self, identity: &Identity, doc: StateDoc) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let encoded = serde_json::to_string(&doc).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let _: () = conn
            .set(Self::state_key(identity), encoded)
            .await
            .map_err(|e| StoreError::Query {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn write_metrics(&self, identity: &Identity, metrics: Metrics) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let encoded =
            serde_json::to_string(&metrics).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let _: () = conn
            .set(Self::metrics_key(identity), encoded)
            .await
            .map_err(|e| StoreError::Query {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn assemble(state: Option<StateDoc>, metrics: Option<Metrics>, now: i64) -> Record {
        let StateDoc {
            state,
            transitioned_at,
        } = state.unwrap_or(StateDoc {
            state: CircuitState::Closed,
            transitioned_at: now,
        });
        Record {
            state,
            metrics: metrics.unwrap_or_default(),
            transitioned_at,
        }
    }
}

#[async_trait]
impl Store for CacheStore {
    async fn find_or_create(&self, identity: &Identity, now: i64) -> Result<Record, StoreError> {
        let state = self.read_state(identity).await?;
        let metrics = self.read_metrics(identity).await?;
        if state.is_none() {
            self.write_state(
                identity,
                StateDoc {
                    state: CircuitState::Closed,
                    transitioned_at: now,
                },
            )
            .await?;
        }
        if metrics.is_none() {
            self.write_metrics(identity, Metrics::default()).await?;
        }
        Ok(Self::assemble(state, metrics, now))
    }

    async fn record_success(&self, identity: &Identity, now: i64) -> Result<Record, StoreError> {
        let state = self.read_state(identity).await?;
        let metrics = self.read_metrics(identity).await?.unwrap_or_default();
        let updated = metrics.with_success(now);
        self.write_metrics(identity, updated).await?;
        Ok(Self::assemble(state, Some(updated), now))
    }

    async fn record_failure(&self, identity: &Identity, now: i64) -> Result<Record, StoreError> {
        let state = self.read_state(identity).await?;
        let metrics = self.read_metrics(identity).await?.unwrap_or_default();
        let updated = metrics.with_failure(now);
        self.write_metrics(identity, updated).await?;
        Ok(Self::assemble(state, Some(updated), now))
    }

    async fn transition(&self, identity: &Identity, state: CircuitState, now: i64) -> Result<Record, StoreError> {
        let metrics = self.read_metrics(identity).await?.unwrap_or_default();
        let updated = metrics.with_consecutive_reset();
        self.write_metrics(identity, updated).await?;
        let doc = StateDoc {
            state,
            transitioned_at: now,
        };
        self.write_state(identity, doc).await?;
        Ok(Self::assemble(Some(doc), Some(updated), now))
    }

    async fn reset(&self, identity: &Identity, now: i64) -> Result<Record, StoreError> {
        let doc = StateDoc {
            state: CircuitState::Closed,
            transitioned_at: now,
        };
        self.write_state(identity, doc).await?;
        self.write_metrics(identity, Metrics::default()).await?;
        Ok(Self::assemble(Some(doc), Some(Metrics::default()), now))
    }

    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        let start = Instant::now();
        let mut conn = self.conn.clone();
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => HealthStatus::healthy(start.elapsed().as_millis() as u64),
            Err(_) => HealthStatus::unavailable(),
        }
    }
}
