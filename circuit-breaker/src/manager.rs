use std::collections::HashMap;
use std::sync::Arc;

use cb_config::{PrimaryKeyType, Settings, StoreSettings};
use cb_errors::{CircuitBreakerError, StoreError};
use cb_model::{
    Clock, Configuration, Event, EventBus, EventKind, Scope, ScopeRef, Store, Strategy, StrategyRegistry,
    SystemClock,
};
use cb_store::{DriverRegistry, StoreConfig};
use tokio::sync::RwLock as AsyncRwLock;

use crate::breaker::Breaker;
use crate::fallback::{FallbackHandler, FallbackRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeSide {
    Context,
    Boundary,
}

/// Configuration lookup, driver factory, strategy registry, and the
/// fluent scope builder (`for_context`/`boundary`) that together resolve
/// `(Configuration, Store, Strategy, Scope) → Breaker`.
///
/// Cheaply `Clone`: every field is an `Arc` (or, for `scope`/`store_override`,
/// a small owned value), so `for_context`/`boundary`/`using_store` can
/// clone-and-set without disturbing the manager they were called on —
/// matching the teacher's `with_*` builder style used throughout
/// `MemoryManager`/`InstrumentedBackend`.
#[derive(Clone)]
pub struct Manager {
    settings: Arc<Settings>,
    drivers: Arc<parking_lot::RwLock<DriverRegistry>>,
    store_cache: Arc<AsyncRwLock<HashMap<String, Arc<dyn Store>>>>,
    strategies: Arc<parking_lot::RwLock<StrategyRegistry>>,
    fallbacks: Arc<parking_lot::RwLock<FallbackRegistry>>,
    events: Arc<parking_lot::RwLock<EventBus>>,
    clock: Arc<dyn Clock>,
    scope: Scope,
    store_override: Option<String>,
}

impl Manager {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let fallbacks_enabled = settings.fallbacks.enabled;
        Self {
            settings: Arc::new(settings),
            drivers: Arc::new(parking_lot::RwLock::new(DriverRegistry::new())),
            store_cache: Arc::new(AsyncRwLock::new(HashMap::new())),
            strategies: Arc::new(parking_lot::RwLock::new(StrategyRegistry::new())),
            fallbacks: Arc::new(parking_lot::RwLock::new(FallbackRegistry::new(fallbacks_enabled))),
            events: Arc::new(parking_lot::RwLock::new(EventBus::new())),
            clock: Arc::new(SystemClock),
            scope: Scope::global(),
            store_override: None,
        }
    }

    /// Swaps the injectable clock (e.g. for a `ManualClock` in tests).
    /// Returns a new manager; the clock is shared by every `Breaker` it
    /// subsequently makes.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Binds the "who" side of the scope. `None` denotes global (no
    /// context). Raises `MorphKeyViolation` immediately if enforcement is
    /// on and `context`'s type-tag isn't mapped — matching `spec.md` §4.5's
    /// "raised when the scope is bound".
    pub fn for_context(&self, context: Option<ScopeRef>) -> Result<Manager, CircuitBreakerError> {
        self.validate_scope_ref(context.as_ref(), ScopeSide::Context)?;
        let mut next = self.clone();
        next.scope.context = context;
        Ok(next)
    }

    /// Binds the "what" side of the scope. Same validation rule as
    /// [`Manager::for_context`], against the boundary morph key map.
    pub fn boundary(&self, boundary: Option<ScopeRef>) -> Result<Manager, CircuitBreakerError> {
        self.validate_scope_ref(boundary.as_ref(), ScopeSide::Boundary)?;
        let mut next = self.clone();
        next.scope.boundary = boundary;
        Ok(next)
    }

    /// Overrides which `stores[name]` entry backs breakers made from this
    /// manager. Not named in the abstract `Make` signature, but every
    /// multi-store deployment needs a way to pick a non-default store —
    /// the teacher's equivalent builders all expose one knob per concern,
    /// so this follows the same `for_context`/`boundary` clone-and-set
    /// shape rather than threading a parameter through `make`.
    #[must_use]
    pub fn using_store(&self, name: impl Into<String>) -> Manager {
        let mut next = self.clone();
        next.store_override = Some(name.into());
        next
    }

    fn validate_scope_ref(
        &self,
        scope_ref: Option<&ScopeRef>,
        side: ScopeSide,
    ) -> Result<(), CircuitBreakerError> {
        let Some(scope_ref) = scope_ref else {
            return Ok(());
        };
        let (enforce, map) = match side {
            ScopeSide::Context => (
                self.settings.scope_validation.enforce_morph_key_map,
                &self.settings.scope_validation.morph_key_map,
            ),
            ScopeSide::Boundary => (
                self.settings.scope_validation.enforce_boundary_morph_key_map,
                &self.settings.scope_validation.boundary_morph_key_map,
            ),
        };
        if enforce && !map.contains_key(&scope_ref.type_tag) {
            return Err(CircuitBreakerError::MorphKeyViolation {
                type_tag: scope_ref.type_tag.clone(),
            });
        }
        Ok(())
    }

    /// Builds a `Breaker` for `name`, in the scope bound by
    /// `for_context`/`boundary`, backed by the resolved store, with
    /// `config`/`strategy` overrides applied when given and the
    /// configuration/strategy-registry defaults otherwise.
    pub async fn make(
        &self,
        name: impl Into<String>,
        config: Option<Configuration>,
        strategy: Option<Arc<dyn Strategy>>,
    ) -> Result<Breaker, CircuitBreakerError> {
        let name = name.into();
        let store = self.resolve_store().await?;
        let config = config.unwrap_or_else(|| self.default_configuration(&name));
        let strategy = strategy.unwrap_or_else(|| self.resolve_strategy(&config.strategy_name));

        Ok(Breaker::new(
            name,
            self.scope.clone(),
            config,
            store,
            strategy,
            self.clock.clone(),
            self.snapshot_events(),
            self.settings.events.enabled,
            self.snapshot_fallbacks(),
        ))
    }

    fn default_configuration(&self, name: &str) -> Configuration {
        let d = &self.settings.defaults;
        Configuration::new(name)
            .with_failure_threshold(d.failure_threshold)
            .with_success_threshold(d.success_threshold)
            .with_timeout_secs(d.timeout_secs)
            .with_sampling_duration_secs(d.sampling_duration_secs)
            .with_minimum_throughput(d.minimum_throughput)
            .with_percentage_threshold(d.percentage_threshold)
            .with_strategy_name(d.strategy_name.clone())
            .with_ignore(self.settings.exceptions.ignore.clone())
            .with_record(self.settings.exceptions.record.clone())
    }

    fn resolve_strategy(&self, name: &str) -> Arc<dyn Strategy> {
        let strategies = self.strategies.read();
        strategies
            .get(name)
            .or_else(|| strategies.get(&self.settings.strategies.default))
            .unwrap_or_else(|| Arc::new(cb_model::ConsecutiveFailures))
    }

    fn snapshot_fallbacks(&self) -> Arc<FallbackRegistry> {
        Arc::new(self.fallbacks.read().clone())
    }

    fn snapshot_events(&self) -> Arc<EventBus> {
        Arc::new(self.events.read().clone())
    }

    async fn resolve_store(&self) -> Result<Arc<dyn Store>, CircuitBreakerError> {
        let store_name = self
            .store_override
            .clone()
            .unwrap_or_else(|| self.settings.default.clone());

        {
            let cache = self.store_cache.read().await;
            if let Some(store) = cache.get(&store_name) {
                return Ok(store.clone());
            }
        }

        let store_settings = self
            .settings
            .stores
            .get(&store_name)
            .cloned()
            .ok_or_else(|| CircuitBreakerError::UndefinedStore(store_name.clone()))?;
        let store_config = to_store_config(&store_settings, self.settings.primary_key_type);

        // DriverRegistry::create is async; clone the (cheaply-Arc-backed)
        // registry out of the lock first so the guard doesn't have to live
        // across the await.
        let registry = self.drivers.read().clone();
        let store = registry.create(&store_name, store_config).await?;

        let mut cache = self.store_cache.write().await;
        let store = cache.entry(store_name).or_insert_with(|| store).clone();
        Ok(store)
    }

    pub fn register_driver(&self, driver: &'static str, factory: cb_store::DriverFactory) {
        self.drivers.write().register(driver, factory);
    }

    pub fn register_strategy(&self, strategy: Arc<dyn Strategy>) {
        self.strategies.write().register(strategy);
    }

    pub fn register_fallback(&self, name: impl Into<String>, handler: FallbackHandler) {
        self.fallbacks.write().register(name, handler);
    }

    pub fn set_default_fallback(&self, handler: FallbackHandler) {
        self.fallbacks.write().set_default(handler);
    }

    /// Registers a listener for one event kind. Listeners are dispatched
    /// synchronously in the caller's own task (`spec.md` §4.3) and must not
    /// panic: a panicking listener would unwind through the `Breaker::call`
    /// that triggered it.
    pub fn on_event(&self, kind: EventKind, handler: Arc<dyn Fn(&Event) + Send + Sync>) {
        self.events.write().on(kind, handler);
    }

    /// Registers the same listener for every event kind.
    pub fn subscribe_all(&self, handler: Arc<dyn Fn(&Event) + Send + Sync>) {
        self.events.write().subscribe_all(handler);
    }

    /// The worker-recycle hook from `spec.md` §5: clears every cached
    /// store's in-process state. A no-op for cache/durable drivers, whose
    /// `Store::flush` implementations do nothing; meaningful for memory
    /// drivers, whose `DashMap` this is the only way to reset.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let cache = self.store_cache.read().await;
        for store in cache.values() {
            store.flush().await?;
        }
        Ok(())
    }
}

fn to_store_config(settings: &StoreSettings, primary_key_type: PrimaryKeyType) -> StoreConfig {
    match settings {
        StoreSettings::Memory => StoreConfig::Memory,
        StoreSettings::Cache { connection, .. } => StoreConfig::Cache {
            redis_url: connection.clone(),
        },
        StoreSettings::Durable { connection, .. } => StoreConfig::Durable {
            database_url: connection.clone(),
            primary_key_type,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_model::CircuitState;

    fn settings() -> Settings {
        Settings::default()
    }

    #[tokio::test]
    async fn make_resolves_memory_store_by_default() {
        let manager = Manager::new(settings());
        let breaker = manager.make("svc", None, None).await.unwrap();
        assert_eq!(breaker.state().await.unwrap(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn undefined_store_is_rejected() {
        let manager = Manager::new(settings()).using_store("nonexistent");
        let result = manager.make("svc", None, None).await;
        assert!(matches!(result, Err(CircuitBreakerError::UndefinedStore(_))));
    }

    #[tokio::test]
    async fn for_context_and_boundary_do_not_mutate_the_original_manager() {
        let base = Manager::new(settings());
        let scoped = base
            .for_context(Some(ScopeRef::new("tenant", "t1")))
            .unwrap()
            .boundary(Some(ScopeRef::new("account", "a1")))
            .unwrap();

        assert!(base.scope.context.is_none());
        assert!(base.scope.boundary.is_none());
        assert!(scoped.scope.context.is_some());
        assert!(scoped.scope.boundary.is_some());
    }

    #[tokio::test]
    async fn enforced_morph_key_map_rejects_unmapped_type_tag() {
        let mut s = settings();
        s.scope_validation.enforce_morph_key_map = true;
        s.scope_validation
            .morph_key_map
            .insert("tenant".to_string(), "uuid".to_string());
        let manager = Manager::new(s);

        assert!(manager.for_context(Some(ScopeRef::new("tenant", "t1"))).is_ok());
        assert!(matches!(
            manager.for_context(Some(ScopeRef::new("user", "u1"))),
            Err(CircuitBreakerError::MorphKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn distinct_scopes_yield_independent_breakers_on_the_shared_store() {
        let manager = Manager::new(settings());
        let a = manager
            .for_context(Some(ScopeRef::new("user", "u1")))
            .unwrap()
            .make("x", None, None)
            .await
            .unwrap();
        let b = manager
            .for_context(Some(ScopeRef::new("user", "u2")))
            .unwrap()
            .make("x", None, None)
            .await
            .unwrap();

        for _ in 0..5 {
            let _ = a
                .call(|| async { Err::<(), _>(std::io::Error::other("boom")) })
                .await;
        }

        assert_eq!(a.state().await.unwrap(), CircuitState::Open);
        assert_eq!(b.state().await.unwrap(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn flush_clears_the_memory_driver_between_worker_generations() {
        let manager = Manager::new(settings());
        let breaker = manager.make("svc", None, None).await.unwrap();
        let _ = breaker
            .call(|| async { Err::<(), _>(std::io::Error::other("boom")) })
            .await;
        assert_eq!(breaker.metrics().await.unwrap().total_failures, 1);

        manager.flush().await.unwrap();
        assert_eq!(breaker.metrics().await.unwrap().total_failures, 0);
    }
}
