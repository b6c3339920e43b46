//! Deadline-based timers driven by the caller's event loop.
//!
//! Nothing here sleeps or spawns. The loop passes the current instant in and
//! uses `time_until_due` to bound how long it waits for input.

use std::time::{Duration, Instant};

pub const SCROLL_SAVE_DEBOUNCE: Duration = Duration::from_millis(500);
pub const SCROLL_RESTORE_DELAY: Duration = Duration::from_millis(100);

/// Fires once after `delay` of quiet. Every trigger cancels the pending one
/// and replaces its value.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn trigger(&mut self, now: Instant, value: T) {
        self.pending = Some((now + self.delay, value));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn fire_if_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, value)| value),
            _ => None,
        }
    }

    /// Takes the pending value regardless of its deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(deadline, _)| deadline.saturating_duration_since(now))
    }
}

/// Single deferred action with no cancellation path; a later `schedule`
/// replaces an unfired one.
#[derive(Debug)]
pub struct OneShot<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> OneShot<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, now: Instant, value: T) {
        self.pending = Some((now + self.delay, value));
    }

    pub fn take_if_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((due, _)) if *due <= now => self.pending.take().map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(due, _)| due.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn debouncer_fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debounce = Debouncer::new(SCROLL_SAVE_DEBOUNCE);

        debounce.trigger(start, 10.0);
        assert_eq!(debounce.fire_if_due(start + ms(499)), None);
        assert_eq!(debounce.fire_if_due(start + ms(500)), Some(10.0));
        assert_eq!(debounce.fire_if_due(start + ms(900)), None);
        assert!(!debounce.is_pending());
    }

    #[test]
    fn retrigger_supersedes_pending_value_and_deadline() {
        let start = Instant::now();
        let mut debounce = Debouncer::new(SCROLL_SAVE_DEBOUNCE);

        debounce.trigger(start, 10.0);
        debounce.trigger(start + ms(300), 25.0);
        debounce.trigger(start + ms(450), 40.0);

        assert_eq!(debounce.fire_if_due(start + ms(600)), None);
        assert_eq!(
            debounce.time_until_due(start + ms(600)),
            Some(ms(350))
        );
        assert_eq!(debounce.fire_if_due(start + ms(950)), Some(40.0));
    }

    #[test]
    fn cancel_and_flush_clear_pending_value() {
        let start = Instant::now();
        let mut debounce = Debouncer::new(SCROLL_SAVE_DEBOUNCE);

        debounce.trigger(start, 1);
        debounce.cancel();
        assert_eq!(debounce.fire_if_due(start + ms(1000)), None);

        debounce.trigger(start, 2);
        assert_eq!(debounce.flush(), Some(2));
        assert_eq!(debounce.flush(), None);
    }

    #[test]
    fn one_shot_waits_for_its_delay() {
        let start = Instant::now();
        let mut restore = OneShot::new(SCROLL_RESTORE_DELAY);

        assert_eq!(restore.time_until_due(start), None);
        restore.schedule(start, 55.0);
        assert_eq!(restore.take_if_due(start + ms(99)), None);
        assert_eq!(restore.time_until_due(start + ms(40)), Some(ms(60)));
        assert_eq!(restore.take_if_due(start + ms(100)), Some(55.0));
        assert_eq!(restore.take_if_due(start + ms(200)), None);
    }
}
