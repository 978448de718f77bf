use serde::{Deserialize, Serialize};

/// The three-state lifecycle of a circuit breaker record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation: requests pass through.
    #[default]
    Closed,
    /// Failures exceeded the configured strategy's threshold: requests are
    /// rejected until the cooldown elapses.
    Open,
    /// Probing recovery after cooldown: a limited window during which the
    /// next outcome decides Closed vs. Open again.
    HalfOpen,
}

impl CircuitState {
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, CircuitState::Open)
    }

    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, CircuitState::Closed)
    }

    #[must_use]
    pub fn is_half_open(self) -> bool {
        matches!(self, CircuitState::HalfOpen)
    }

    /// `Closed ∨ HalfOpen` — a request may be attempted against the
    /// protected operation.
    #[must_use]
    pub fn can_attempt_request(self) -> bool {
        !self.is_open()
    }

    /// `Open` — the breaker should reject without invoking the operation.
    #[must_use]
    pub fn should_reject_request(self) -> bool {
        self.is_open()
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}
