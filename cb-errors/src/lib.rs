//! Error types for the circuit breaker engine.
//!
//! Two error families live here:
//!
//! - [`StoreError`]: failures from a concrete [`Store`](cb_model::Store)
//!   driver (memory, cache, durable).
//! - [`CircuitBreakerError`]: failures raised by the [`Manager`] while
//!   resolving or constructing a breaker (undefined store, unsupported
//!   driver, scope validation).
//!
//! `CircuitBreakerOpen` — the rejection a live `Call` raises — is not here.
//! It is a per-call result, not a construction-time error, and is defined
//! alongside the engine in the `circuit-breaker` crate.

use thiserror::Error;

/// A failure surfaced by a [`Store`](cb_model::Store) driver.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection to {backend} failed: {reason}")]
    Connection { backend: String, reason: String },

    #[error("query on {backend} failed: {reason}")]
    Query { backend: String, reason: String },

    #[error("transaction on {backend} failed: {reason}")]
    Transaction { backend: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("record not found for identity {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// A failure raised while resolving configuration or building a breaker.
#[derive(Debug, Error)]
pub enum CircuitBreakerError {
    /// Configuration names a store that has no `stores[name]` entry.
    #[error("store '{0}' is not defined in configuration")]
    UndefinedStore(String),

    /// The named store requests a driver with no registered factory.
    #[error("no driver factory registered for driver '{driver}' (store '{store}')")]
    UnsupportedDriver { store: String, driver: String },

    /// A scope bound an unmapped type-tag while enforcement was on.
    #[error("scope type tag '{type_tag}' is not in the morph key map")]
    MorphKeyViolation { type_tag: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
