use std::collections::HashMap;
use std::sync::Arc;

/// A fallback handler: given the rejected breaker's name, produces the
/// value attached to `CallError::Rejected`. May itself fail — a failing
/// handler overrides the default "reject with no value" behaviour with a
/// `CallError::FallbackFailed`.
pub type FallbackHandler = Arc<dyn Fn(&str) -> Result<serde_json::Value, anyhow::Error> + Send + Sync>;

/// Per-name fallback handlers plus one global default, consulted when a
/// call is rejected because the breaker is `Open` and its cooldown hasn't
/// elapsed. Disabled entirely via `enabled`, mirroring `fallbacks.enabled`
/// in the configuration surface.
#[derive(Clone, Default)]
pub struct FallbackRegistry {
    enabled: bool,
    handlers: HashMap<String, FallbackHandler>,
    default_handler: Option<FallbackHandler>,
}

impl FallbackRegistry {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            handlers: HashMap::new(),
            default_handler: None,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn register(&mut self, name: impl Into<String>, handler: FallbackHandler) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn set_default(&mut self, handler: FallbackHandler) {
        self.default_handler = Some(handler);
    }

    /// Resolves a fallback value for a rejected call against breaker
    /// `name`: per-name handler first, then the global default, then
    /// `None`. Propagates a handler's own failure rather than swallowing
    /// it, per `spec.md` §4.3 ("a handler may itself raise an exception").
    pub fn resolve(&self, name: &str) -> Result<Option<serde_json::Value>, anyhow::Error> {
        if !self.enabled {
            return Ok(None);
        }
        match self.handlers.get(name).or(self.default_handler.as_ref()) {
            Some(handler) => handler(name).map(Some),
            None => Ok(None),
        }
    }
}
