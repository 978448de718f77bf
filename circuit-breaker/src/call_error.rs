use cb_errors::StoreError;

/// The result of a rejected or failed `Breaker::call`. This is the Rust
/// re-expression of "returns a value or raises `CircuitBreakerOpen`"
/// (`spec.md` §4.3/§7): `Failed(E)` is always the unchanged, re-raised
/// operation error — classification only ever affects store bookkeeping,
/// never whether the error reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum CallError<E> {
    /// The breaker was `Open` and its cooldown had not elapsed, so the
    /// operation was never attempted.
    #[error("circuit '{name}' is open")]
    Rejected {
        name: String,
        fallback: Option<serde_json::Value>,
    },

    /// A registered fallback handler raised instead of returning a value.
    #[error("circuit '{name}' is open and its fallback handler failed: {source}")]
    FallbackFailed { name: String, source: anyhow::Error },

    /// The protected operation failed. Carried unchanged regardless of
    /// whether the failure was recorded against the breaker.
    #[error(transparent)]
    Failed(E),

    /// The store backing this breaker failed. Not part of the distilled
    /// spec's three-variant sketch, but a real driver (Redis down, Postgres
    /// connection refused) can fail independently of the protected
    /// operation, and that failure has to surface somewhere — see
    /// DESIGN.md's note on this addition.
    #[error("circuit breaker store error: {0}")]
    Store(#[from] StoreError),
}

impl<E> CallError<E> {
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, CallError::Rejected { .. })
    }
}
