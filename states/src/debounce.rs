//! Debounced value holder driven by the frame clock.
//!
//! The holder is owned by whatever controller needs debouncing, so its lifetime is
//! the controller's lifetime: dropping the controller drops the pending value and
//! nothing can fire afterwards. There are no timers; the owner calls [`Debouncer::poll`]
//! from its per-frame tick with the current [`crate::Time`].

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: TimeDelta,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    last_input: DateTime<Utc>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: TimeDelta) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn from_millis(millis: i64) -> Self {
        Self::new(TimeDelta::milliseconds(millis))
    }

    pub fn delay(&self) -> TimeDelta {
        self.delay
    }

    /// Replaces the pending value and restarts the quiet window.
    pub fn push(&mut self, value: T, now: DateTime<Utc>) {
        self.pending = Some(Pending {
            value,
            last_input: now,
        });
    }

    /// Returns the last pushed value once the quiet window has elapsed.
    ///
    /// A value is yielded at most once.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<T> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|pending| now.signed_duration_since(pending.last_input) >= self.delay);
        if ready {
            self.pending.take().map(|pending| pending.value)
        } else {
            None
        }
    }

    /// Drops the pending value without emitting it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value becomes due, if any. Lets the UI schedule a repaint.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.pending
            .as_ref()
            .map(|pending| pending.last_input + self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn ms(n: i64) -> TimeDelta {
        TimeDelta::milliseconds(n)
    }

    #[test]
    fn rapid_pushes_collapse_into_last_value() {
        let mut debouncer = Debouncer::from_millis(500);
        debouncer.push("f", t0());
        debouncer.push("fo", t0() + ms(50));
        debouncer.push("foo", t0() + ms(100));

        assert_eq!(debouncer.poll(t0() + ms(500)), None);
        assert_eq!(debouncer.poll(t0() + ms(600)), Some("foo"));
        assert_eq!(debouncer.poll(t0() + ms(2000)), None);
    }

    #[test]
    fn nothing_fires_before_quiet_window() {
        let mut debouncer = Debouncer::from_millis(500);
        debouncer.push(1, t0());
        assert_eq!(debouncer.poll(t0() + ms(499)), None);
        assert!(debouncer.is_pending());
    }

    #[test]
    fn cancel_drops_pending_value() {
        let mut debouncer = Debouncer::from_millis(500);
        debouncer.push(1, t0());
        assert_eq!(debouncer.cancel(), Some(1));
        assert_eq!(debouncer.poll(t0() + ms(1000)), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn due_at_tracks_last_input() {
        let mut debouncer = Debouncer::from_millis(300);
        assert_eq!(debouncer.due_at(), None);
        debouncer.push((), t0() + ms(20));
        assert_eq!(debouncer.due_at(), Some(t0() + ms(320)));
    }
}
