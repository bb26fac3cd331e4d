use chrono::{DateTime, Utc};

use crate::State;

/// Frame clock.
///
/// The UI stamps this once per frame; tests pin it to fixed instants so anything
/// time-based (debounce windows, cache staleness) stays deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    now: DateTime<Utc>,
}

impl Default for Time {
    fn default() -> Self {
        Self { now: Utc::now() }
    }
}

impl Time {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn set(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }
}

impl State for Time {
    fn snapshot(&self) -> Option<Self> {
        Some(*self)
    }
}

impl AsRef<DateTime<Utc>> for Time {
    fn as_ref(&self) -> &DateTime<Utc> {
        &self.now
    }
}
