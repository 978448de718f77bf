use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Injectable source of "now", in unix-epoch seconds. Every time-based
/// decision in the engine (cooldown elapsed, sampling window recency) goes
/// through this trait rather than calling `SystemTime::now()` directly, so
/// tests can drive it deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// The production clock, backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the unix epoch")
            .as_secs() as i64
    }
}

/// A clock tests can set and advance explicitly. Starts at `0` unless
/// constructed with [`ManualClock::at`]. Only ever built behind the
/// `testing` feature (or a unit test's own `cfg(test)`) — wiring it into a
/// release build would let a breaker's cooldown be driven by something
/// other than wall-clock time.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

#[cfg(any(test, feature = "testing"))]
impl ManualClock {
    #[must_use]
    pub fn at(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for ManualClock {
    fn default() -> Self {
        Self::at(0)
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
