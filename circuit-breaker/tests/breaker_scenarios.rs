//! End-to-end scenarios S1-S6 from `spec.md` §8, driven against a
//! `Manager`-built `Breaker` over the in-process memory store with a
//! `ManualClock` so cooldown/sampling-window behaviour is deterministic.

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cb_config::Settings;
use cb_model::{CircuitState, Event, EventKind};
use circuit_breaker::{CallError, ManualClock, Manager, ScopeRef};

fn failing() -> impl Future<Output = Result<(), io::Error>> {
    std::future::ready(Err(io::Error::other("downstream unavailable")))
}

fn succeeding() -> impl Future<Output = Result<(), io::Error>> {
    std::future::ready(Ok(()))
}

async fn manager_with_clock() -> (Manager, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at(0));
    let manager = Manager::new(Settings::default()).with_clock(clock.clone());
    (manager, clock)
}

#[tokio::test]
async fn s1_trip_on_sudden_outage() {
    let (manager, _clock) = manager_with_clock().await;
    let breaker = manager.make("payments", None, None).await.unwrap();

    for _ in 0..4 {
        let _ = breaker.call(|| failing()).await;
    }
    assert_eq!(breaker.state().await.unwrap(), cb_model::CircuitState::Closed);

    let result = breaker.call(|| failing()).await;
    assert!(matches!(result, Err(CallError::Failed(_))));
    assert_eq!(breaker.state().await.unwrap(), cb_model::CircuitState::Open);
    assert_eq!(breaker.metrics().await.unwrap().consecutive_failures, 5);
}

#[tokio::test]
async fn s1_request_failed_event_carries_the_post_transition_state() {
    let (manager, _clock) = manager_with_clock().await;

    let failed_states: Arc<Mutex<Vec<CircuitState>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = failed_states.clone();
    manager.on_event(
        EventKind::RequestFailed,
        Arc::new(move |event| {
            if let Event::RequestFailed { state, .. } = event {
                recorded.lock().unwrap().push(*state);
            }
        }),
    );

    let breaker = manager.make("payments", None, None).await.unwrap();
    for _ in 0..5 {
        let _ = breaker.call(|| failing()).await;
    }

    let states = failed_states.lock().unwrap();
    assert_eq!(states.len(), 5);
    assert!(states[..4].iter().all(|s| *s == CircuitState::Closed));
    assert_eq!(states[4], CircuitState::Open);
}

#[tokio::test]
async fn s2_half_open_probing_closes_and_request_succeeded_event_reflects_it() {
    let (manager, clock) = manager_with_clock().await;

    let succeeded_states: Arc<Mutex<Vec<CircuitState>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = succeeded_states.clone();
    manager.on_event(
        EventKind::RequestSucceeded,
        Arc::new(move |event| {
            if let Event::RequestSucceeded { state, .. } = event {
                recorded.lock().unwrap().push(*state);
            }
        }),
    );

    let breaker = manager.make("payments", None, None).await.unwrap();
    for _ in 0..5 {
        let _ = breaker.call(|| failing()).await;
    }
    clock.advance(60);
    breaker.call(|| succeeding()).await.unwrap();
    breaker.call(|| succeeding()).await.unwrap();

    let states = succeeded_states.lock().unwrap();
    assert_eq!(states.as_slice(), [CircuitState::HalfOpen, CircuitState::Closed]);
}

#[tokio::test]
async fn s2_half_open_probing_closes() {
    let (manager, clock) = manager_with_clock().await;
    let breaker = manager.make("payments", None, None).await.unwrap();

    for _ in 0..5 {
        let _ = breaker.call(|| failing()).await;
    }
    assert_eq!(breaker.state().await.unwrap(), cb_model::CircuitState::Open);

    clock.advance(60);
    breaker.call(|| succeeding()).await.unwrap();
    assert_eq!(breaker.state().await.unwrap(), cb_model::CircuitState::HalfOpen);
    assert_eq!(breaker.metrics().await.unwrap().consecutive_successes, 1);

    breaker.call(|| succeeding()).await.unwrap();
    assert_eq!(breaker.state().await.unwrap(), cb_model::CircuitState::Closed);
    assert_eq!(breaker.metrics().await.unwrap().consecutive_successes, 0);
    assert_eq!(breaker.metrics().await.unwrap().consecutive_failures, 0);
}

#[tokio::test]
async fn s3_half_open_failure_reopens() {
    let (manager, clock) = manager_with_clock().await;
    let breaker = manager.make("payments", None, None).await.unwrap();

    for _ in 0..5 {
        let _ = breaker.call(|| failing()).await;
    }
    clock.advance(60);

    let result = breaker.call(|| failing()).await;
    assert!(matches!(result, Err(CallError::Failed(_))));
    assert_eq!(breaker.state().await.unwrap(), cb_model::CircuitState::Open);
}

#[tokio::test]
async fn s4_percentage_with_throughput_gate() {
    let (manager, _clock) = manager_with_clock().await;
    let config = cb_model::Configuration::new("ratio-svc")
        .with_strategy_name("percentage_failures")
        .with_percentage_threshold(50.0)
        .with_minimum_throughput(10);
    let breaker = manager.make("ratio-svc", Some(config), None).await.unwrap();

    for _ in 0..3 {
        let _ = breaker.call(|| failing()).await;
    }
    for _ in 0..2 {
        breaker.call(|| succeeding()).await.unwrap();
    }
    assert_eq!(breaker.state().await.unwrap(), cb_model::CircuitState::Closed);

    for _ in 0..2 {
        let _ = breaker.call(|| failing()).await;
    }
    for _ in 0..2 {
        breaker.call(|| succeeding()).await.unwrap();
    }
    let result = breaker.call(|| failing()).await;
    assert!(result.is_err());
    let metrics = breaker.metrics().await.unwrap();
    assert_eq!(metrics.total_failures + metrics.total_successes, 10);
    assert_eq!(breaker.state().await.unwrap(), cb_model::CircuitState::Open);
}

#[derive(Debug)]
struct ValidationError;

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed")
    }
}

impl std::error::Error for ValidationError {}

#[tokio::test]
async fn s5_ignored_exception_does_not_count() {
    let (manager, _clock) = manager_with_clock().await;
    let config = cb_model::Configuration::new("validated-svc")
        .with_ignore(vec![std::any::type_name::<ValidationError>().to_string()]);
    let breaker = manager.make("validated-svc", Some(config), None).await.unwrap();

    let failed_events = Arc::new(AtomicUsize::new(0));
    let counter = failed_events.clone();
    manager.on_event(
        cb_model::EventKind::RequestFailed,
        Arc::new(move |_event| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    // The listener registered above only affects breakers made *after* this
    // point, since `make` snapshots the event bus; this breaker was already
    // made, so register before making it in the assertion below instead.
    let breaker_with_listener = manager.make("validated-svc-2", Some(breaker.config().clone()), None).await.unwrap();

    for _ in 0..10 {
        let result = breaker_with_listener.call(|| async { Err::<(), _>(ValidationError) }).await;
        assert!(matches!(result, Err(CallError::Failed(_))));
    }

    assert_eq!(breaker_with_listener.state().await.unwrap(), cb_model::CircuitState::Closed);
    assert_eq!(breaker_with_listener.metrics().await.unwrap().total_failures, 0);
    assert_eq!(failed_events.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn s6_scope_isolation_by_context_and_boundary() {
    let (manager, _clock) = manager_with_clock().await;

    let ctx_a = manager.for_context(Some(ScopeRef::new("user", "u1"))).unwrap();
    let ctx_b = manager.for_context(Some(ScopeRef::new("user", "u2"))).unwrap();
    let a = ctx_a.make("x", None, None).await.unwrap();
    let b = ctx_b.make("x", None, None).await.unwrap();
    for _ in 0..5 {
        let _ = a.call(|| failing()).await;
    }
    assert_eq!(a.state().await.unwrap(), cb_model::CircuitState::Open);
    assert_eq!(b.state().await.unwrap(), cb_model::CircuitState::Closed);
    assert_eq!(b.metrics().await.unwrap().total_failures, 0);

    let bnd_a = manager.boundary(Some(ScopeRef::new("account", "acc1"))).unwrap();
    let bnd_b = manager.boundary(Some(ScopeRef::new("account", "acc2"))).unwrap();
    let c = bnd_a.make("y", None, None).await.unwrap();
    let d = bnd_b.make("y", None, None).await.unwrap();
    for _ in 0..5 {
        let _ = c.call(|| failing()).await;
    }
    assert_eq!(c.state().await.unwrap(), cb_model::CircuitState::Open);
    assert_eq!(d.state().await.unwrap(), cb_model::CircuitState::Closed);

    let dual_a = manager
        .for_context(Some(ScopeRef::new("user", "u1")))
        .unwrap()
        .boundary(Some(ScopeRef::new("account", "acc1")))
        .unwrap();
    let dual_b = manager
        .for_context(Some(ScopeRef::new("user", "u1")))
        .unwrap()
        .boundary(Some(ScopeRef::new("account", "acc2")))
        .unwrap();
    let e = dual_a.make("z", None, None).await.unwrap();
    let f = dual_b.make("z", None, None).await.unwrap();
    for _ in 0..5 {
        let _ = e.call(|| failing()).await;
    }
    assert_eq!(e.state().await.unwrap(), cb_model::CircuitState::Open);
    assert_eq!(f.state().await.unwrap(), cb_model::CircuitState::Closed);
}

#[tokio::test]
async fn rejected_call_carries_a_resolved_fallback_value() {
    let (manager, _clock) = manager_with_clock().await;
    manager.set_default_fallback(Arc::new(|name| Ok(serde_json::json!({ "breaker": name }))));
    let breaker = manager.make("payments", None, None).await.unwrap();

    for _ in 0..5 {
        let _ = breaker.call(|| failing()).await;
    }
    let result = breaker.call(|| failing()).await;
    match result {
        Err(CallError::Rejected { name, fallback }) => {
            assert_eq!(name, "payments");
            assert_eq!(fallback, Some(serde_json::json!({ "breaker": "payments" })));
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn reset_zeroes_everything_and_reopens_the_gate() {
    let (manager, _clock) = manager_with_clock().await;
    let breaker = manager.make("payments", None, None).await.unwrap();

    for _ in 0..5 {
        let _ = breaker.call(|| failing()).await;
    }
    assert_eq!(breaker.state().await.unwrap(), cb_model::CircuitState::Open);

    breaker.reset().await.unwrap();
    assert_eq!(breaker.state().await.unwrap(), cb_model::CircuitState::Closed);
    let metrics = breaker.metrics().await.unwrap();
    assert_eq!(metrics.total_failures, 0);
    assert_eq!(metrics.consecutive_failures, 0);
}
