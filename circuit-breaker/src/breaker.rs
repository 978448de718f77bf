use std::future::Future;
use std::sync::Arc;

use cb_model::{
    ClassifiableError, Clock, CircuitState, Configuration, Event, EventBus, Identity, Metrics, Scope, Store,
    Strategy,
};

use crate::call_error::CallError;
use crate::fallback::FallbackRegistry;

/// One guarded identity: `(name, scope)` plus the configuration, store,
/// strategy, clock, and event/fallback wiring that decide its behaviour.
/// All of the engine's mutable state lives in `store`; everything else
/// here is immutable and freely `Clone`-shareable across concurrent
/// callers, per `spec.md` §5.
#[derive(Clone)]
pub struct Breaker {
    name: String,
    scope: Scope,
    identity: Identity,
    config: Configuration,
    store: Arc<dyn Store>,
    strategy: Arc<dyn Strategy>,
    clock: Arc<dyn Clock>,
    events: Arc<EventBus>,
    events_enabled: bool,
    fallbacks: Arc<FallbackRegistry>,
}

impl Breaker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        scope: Scope,
        config: Configuration,
        store: Arc<dyn Store>,
        strategy: Arc<dyn Strategy>,
        clock: Arc<dyn Clock>,
        events: Arc<EventBus>,
        events_enabled: bool,
        fallbacks: Arc<FallbackRegistry>,
    ) -> Self {
        let identity = Identity::new(name.clone(), scope.clone());
        Self {
            name,
            scope,
            identity,
            config,
            store,
            strategy,
            clock,
            events,
            events_enabled,
            fallbacks,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Current state, read fresh from the store.
    pub async fn state(&self) -> Result<CircuitState, cb_errors::StoreError> {
        let now = self.clock.now();
        Ok(self.store.find_or_create(&self.identity, now).await?.state)
    }

    /// Current metrics, read fresh from the store.
    pub async fn metrics(&self) -> Result<Metrics, cb_errors::StoreError> {
        let now = self.clock.now();
        Ok(self.store.find_or_create(&self.identity, now).await?.metrics)
    }

    /// Zeroes the store record for this identity and emits `Closed`, per
    /// the normative "explicit Reset zeros everything" rule in `spec.md`
    /// §3.
    pub async fn reset(&self) -> Result<(), cb_errors::StoreError> {
        let now = self.clock.now();
        self.store.reset(&self.identity, now).await?;
        self.emit(Event::Closed {
            identity: self.identity.clone(),
            at: now,
        });
        Ok(())
    }

    fn emit(&self, event: Event) {
        if self.events_enabled {
            self.events.emit(event);
        }
    }

    /// Executes `op` under protection. Returns `op`'s result, or a
    /// [`CallError`] describing why it didn't run (the circuit was open)
    /// or why it failed (the operation's own error, unchanged).
    pub async fn call<F, Fut, T, E>(&self, op: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ClassifiableError,
    {
        let now = self.clock.now();
        let mut record = self.store.find_or_create(&self.identity, now).await?;

        self.emit(Event::RequestAttempted {
            identity: self.identity.clone(),
            state: record.state,
            at: now,
        });

        if record.state.is_open() {
            let cooldown_elapsed = match record.metrics.last_failure_time {
                None => true,
                Some(last_failure) => now - last_failure >= self.config.timeout_secs,
            };

            if cooldown_elapsed {
                record = self
                    .store
                    .transition(&self.identity, CircuitState::HalfOpen, now)
                    .await?;
                tracing::info!(breaker = %self.name, "cooldown elapsed, probing half-open");
                self.emit(Event::HalfOpened {
                    identity: self.identity.clone(),
                    at: now,
                });
            } else {
                let fallback = self
                    .fallbacks
                    .resolve(&self.name)
                    .map_err(|source| CallError::FallbackFailed {
                        name: self.name.clone(),
                        source,
                    })?;
                tracing::warn!(breaker = %self.name, "rejecting call, circuit open");
                return Err(CallError::Rejected {
                    name: self.name.clone(),
                    fallback,
                });
            }
        }

        let pre_call_state = record.state;

        match op().await {
            Ok(value) => {
                let updated = self.store.record_success(&self.identity, now).await?;

                let should_close = pre_call_state.is_half_open()
                    && updated.metrics.consecutive_successes >= self.config.success_threshold;
                let new_state = if should_close {
                    self.store
                        .transition(&self.identity, CircuitState::Closed, now)
                        .await?;
                    tracing::info!(breaker = %self.name, "probe succeeded, closing circuit");
                    CircuitState::Closed
                } else {
                    updated.state
                };

                self.emit(Event::RequestSucceeded {
                    identity: self.identity.clone(),
                    state: new_state,
                    at: now,
                });
                if should_close {
                    self.emit(Event::Closed {
                        identity: self.identity.clone(),
                        at: now,
                    });
                }

                Ok(value)
            }
            Err(err) => {
                let tags = err.failure_tags();
                let recorded = self.config.should_record(&tags);

                if recorded {
                    let updated = self.store.record_failure(&self.identity, now).await?;

                    // Any failure observed while probing re-opens the
                    // circuit, independent of what the configured strategy
                    // would say on a fresh HalfOpen window — see DESIGN.md's
                    // resolution of the spec's HalfOpen-reopen ambiguity.
                    let should_open = pre_call_state.is_half_open()
                        || (pre_call_state.can_attempt_request()
                            && self.strategy.should_open(&updated.metrics, &self.config, now));

                    let new_state = if should_open {
                        self.store
                            .transition(&self.identity, CircuitState::Open, now)
                            .await?;
                        tracing::warn!(breaker = %self.name, tags = ?tags, "circuit opened");
                        CircuitState::Open
                    } else {
                        updated.state
                    };

                    self.emit(Event::RequestFailed {
                        identity: self.identity.clone(),
                        state: new_state,
                        tags: tags.iter().map(|t| (*t).to_string()).collect(),
                        recorded: true,
                        at: now,
                    });
                    if should_open {
                        self.emit(Event::Opened {
                            identity: self.identity.clone(),
                            at: now,
                        });
                    }
                }

                Err(CallError::Failed(err))
            }
        }
    }
}
