//! The circuit breaker engine and manager: the public surface of this
//! workspace. Composes `cb-model`'s state/metrics/scope/strategy types,
//! `cb-store`'s persistence drivers, and `cb-config`'s configuration
//! surface into `Breaker::call` — the tri-state state machine gating a
//! protected operation — and `Manager`, which resolves
//! `(Configuration, Store, Strategy, Scope) → Breaker` from configuration.
//!
//! ```ignore
//! use circuit_breaker::Manager;
//!
//! let manager = Manager::new(cb_config::Settings::default());
//! let breaker = manager.make("payments-api", None, None).await?;
//!
//! let result = breaker.call(|| async { downstream_call().await }).await;
//! ```

pub mod breaker;
pub mod call_error;
pub mod fallback;
pub mod manager;

pub use breaker::Breaker;
pub use call_error::CallError;
pub use fallback::{FallbackHandler, FallbackRegistry};
pub use manager::Manager;

// Re-exported so downstream crates depend on `circuit-breaker` alone for
// the whole public surface, the way the teacher's feature crates
// re-export their shared-types crate rather than making callers add a
// second path dependency.
pub use cb_config::Settings;
pub use cb_errors::{CircuitBreakerError, StoreError};
pub use cb_model::{
    CircuitState, ClassifiableError, Clock, Configuration, Event, EventBus, EventKind, Identity, Metrics, Scope,
    ScopeRef, Store, Strategy, StrategyRegistry, SystemClock,
};
#[cfg(any(test, feature = "testing"))]
pub use cb_model::ManualClock;
