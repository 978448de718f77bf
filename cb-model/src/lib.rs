//! Shared types and trait contracts for the circuit breaker engine:
//! state/metrics/scope value types, the `Store` persistence contract, the
//! pluggable `Strategy` contract, the event model, the injectable clock,
//! and the tag-based failure classification used in place of a runtime
//! exception hierarchy.

pub mod classify;
pub mod clock;
pub mod config;
pub mod event;
pub mod metrics;
pub mod scope;
pub mod state;
pub mod store;
pub mod strategy;

pub use classify::ClassifiableError;
pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::ManualClock;
pub use config::Configuration;
pub use event::{Event, EventBus, EventKind};
pub use metrics::Metrics;
pub use scope::{Identity, Scope, ScopeRef};
pub use state::CircuitState;
pub use store::{HealthStatus, Record, Store};
pub use strategy::{ConsecutiveFailures, PercentageFailures, RollingWindow, Strategy, StrategyRegistry};
