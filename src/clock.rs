//! Time source abstraction
//!
//! Accounts never call `Utc::now()` directly; they read time through a
//! `Clock` handle injected at construction. Production code uses
//! `SystemClock`, tests use `ManualClock` so lockout and session-expiry
//! behaviour is deterministic.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Trait for time sources (wall clock or controllable test clock).
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests.
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Start at the current wall-clock time.
    pub fn from_system() -> Self {
        Self::new(Utc::now())
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.current.lock().unwrap() = to;
    }

    pub fn advance_minutes(&self, minutes: i64) {
        let mut current = self.current.lock().unwrap();
        *current += Duration::minutes(minutes);
    }

    pub fn advance_seconds(&self, seconds: i64) {
        let mut current = self.current.lock().unwrap();
        *current += Duration::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap()
    }
}
