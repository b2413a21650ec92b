//! Test clocks — deterministic `Clock` implementations for tests.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use registrar_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A clock that returns instants from a predetermined sequence. Panics if the
/// sequence is exhausted. Used in tests that need the clock to stall or run
/// backwards between appends.
#[derive(Debug)]
pub struct SequenceClock {
    instants: Vec<DateTime<Utc>>,
    index: Mutex<usize>,
}

impl SequenceClock {
    /// Create a new `SequenceClock` with the given instants.
    #[must_use]
    pub fn new(instants: Vec<DateTime<Utc>>) -> Self {
        Self {
            instants,
            index: Mutex::new(0),
        }
    }
}

impl Clock for SequenceClock {
    fn now(&self) -> DateTime<Utc> {
        let mut index = self.index.lock().unwrap();
        let instant = self.instants[*index];
        *index += 1;
        instant
    }
}

/// A clock that starts at `start` and advances by `step` on every call.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    /// Create a clock whose first reading is `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            next: Mutex::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let instant = *next;
        *next = instant + self.step;
        instant
    }
}
