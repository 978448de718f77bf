use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::scope::Identity;
use crate::state::CircuitState;

/// The six domain events a breaker can emit. Delivered synchronously, in the
/// caller's own task, immediately after the state transition or outcome they
/// describe — never batched or deferred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Opened {
        identity: Identity,
        at: i64,
    },
    Closed {
        identity: Identity,
        at: i64,
    },
    HalfOpened {
        identity: Identity,
        at: i64,
    },
    RequestAttempted {
        identity: Identity,
        state: CircuitState,
        at: i64,
    },
    RequestSucceeded {
        identity: Identity,
        state: CircuitState,
        at: i64,
    },
    RequestFailed {
        identity: Identity,
        state: CircuitState,
        tags: Vec<String>,
        recorded: bool,
        at: i64,
    },
}

/// A stable discriminant for `Event`, used as the `EventBus` dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Opened,
    Closed,
    HalfOpened,
    RequestAttempted,
    RequestSucceeded,
    RequestFailed,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Opened,
        EventKind::Closed,
        EventKind::HalfOpened,
        EventKind::RequestAttempted,
        EventKind::RequestSucceeded,
        EventKind::RequestFailed,
    ];
}

impl Event {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Opened { .. } => EventKind::Opened,
            Event::Closed { .. } => EventKind::Closed,
            Event::HalfOpened { .. } => EventKind::HalfOpened,
            Event::RequestAttempted { .. } => EventKind::RequestAttempted,
            Event::RequestSucceeded { .. } => EventKind::RequestSucceeded,
            Event::RequestFailed { .. } => EventKind::RequestFailed,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        match self {
            Event::Opened { identity, .. }
            | Event::Closed { identity, .. }
            | Event::HalfOpened { identity, .. }
            | Event::RequestAttempted { identity, .. }
            | Event::RequestSucceeded { identity, .. }
            | Event::RequestFailed { identity, .. } => identity,
        }
    }
}

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Fan-out point for events, keyed by [`EventKind`] — one list of handlers
/// per event type, rather than a single flat subscriber list every listener
/// has to filter itself. Gated by `events.enabled` at the call site; the
/// bus itself always dispatches to whatever's registered.
#[derive(Default, Clone)]
pub struct EventBus {
    by_kind: HashMap<EventKind, Vec<Handler>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one event kind.
    pub fn on(&mut self, kind: EventKind, handler: Handler) {
        self.by_kind.entry(kind).or_default().push(handler);
    }

    /// Registers the same handler for every event kind.
    pub fn subscribe_all(&mut self, handler: Handler) {
        for kind in EventKind::ALL {
            self.on(kind, handler.clone());
        }
    }

    pub fn emit(&self, event: Event) {
        if let Some(handlers) = self.by_kind.get(&event.kind()) {
            for handler in handlers {
                handler(&event);
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("kinds_subscribed", &self.by_kind.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::scope::Scope;

    #[test]
    fn event_kind_matches_variant() {
        let identity = Identity::new("svc", Scope::global());
        let e = Event::Opened { identity, at: 1 };
        assert_eq!(e.kind(), EventKind::Opened);
    }

    #[test]
    fn bus_dispatches_only_to_matching_kind() {
        let mut bus = EventBus::new();
        let opened_count = Arc::new(AtomicUsize::new(0));
        let closed_count = Arc::new(AtomicUsize::new(0));
        let oc = opened_count.clone();
        bus.on(
            EventKind::Opened,
            Arc::new(move |_: &Event| {
                oc.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let cc = closed_count.clone();
        bus.on(
            EventKind::Closed,
            Arc::new(move |_: &Event| {
                cc.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bus.emit(Event::Closed {
            identity: Identity::new("svc", Scope::global()),
            at: 0,
        });

        assert_eq!(opened_count.load(Ordering::SeqCst), 0);
        assert_eq!(closed_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscribe_all_receives_every_kind() {
        let mut bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        bus.subscribe_all(Arc::new(move |_: &Event| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        bus.emit(Event::Opened {
            identity: Identity::new("svc", Scope::global()),
            at: 0,
        });
        bus.emit(Event::RequestSucceeded {
            identity: Identity::new("svc", Scope::global()),
            state: CircuitState::Closed,
            at: 0,
        });

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn request_succeeded_and_failed_carry_the_post_operation_state() {
        let succeeded = Event::RequestSucceeded {
            identity: Identity::new("svc", Scope::global()),
            state: CircuitState::Closed,
            at: 0,
        };
        let Event::RequestSucceeded { state, .. } = succeeded else {
            unreachable!()
        };
        assert_eq!(state, CircuitState::Closed);

        let failed = Event::RequestFailed {
            identity: Identity::new("svc", Scope::global()),
            state: CircuitState::Open,
            tags: vec!["io".to_string()],
            recorded: true,
            at: 0,
        };
        let Event::RequestFailed { state, .. } = failed else {
            unreachable!()
        };
        assert_eq!(state, CircuitState::Open);
    }

    #[test]
    fn bus_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.emit(Event::HalfOpened {
            identity: Identity::new("svc", Scope::global()),
            at: 0,
        });
    }
}
