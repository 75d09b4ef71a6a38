//! Cancel-and-restart single-shot timer for trailing-edge debounce.
//!
//! Each editing session owns one of these; there is no shared scheduler, so
//! sessions stay independent. Time is passed in explicitly, which keeps the
//! timer deterministic under test.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// (Re)arm the timer, measured from `now`. Always restarts: the window
    /// is counted from the most recent edit, never the first.
    pub fn restart(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once per armed period, when `now` has passed the
    /// deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn does_not_fire_before_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.restart(start);
        assert!(!debouncer.fire(start + Duration::from_millis(499)));
        assert!(debouncer.is_armed());
    }

    #[test]
    fn fires_once_after_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.restart(start);
        assert!(debouncer.fire(start + WINDOW));
        // Second poll does not fire again until re-armed.
        assert!(!debouncer.fire(start + WINDOW * 2));
    }

    #[test]
    fn restart_pushes_deadline_from_latest_edit() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.restart(start);
        // An edit arrives 400ms in; the window restarts from there.
        debouncer.restart(start + Duration::from_millis(400));
        assert!(!debouncer.fire(start + Duration::from_millis(500)));
        assert!(!debouncer.fire(start + Duration::from_millis(899)));
        assert!(debouncer.fire(start + Duration::from_millis(900)));
    }

    #[test]
    fn cancel_disarms() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.restart(start);
        debouncer.cancel();
        assert!(!debouncer.fire(start + WINDOW * 4));
    }

    #[test]
    fn unarmed_never_fires() {
        let mut debouncer = Debouncer::new(WINDOW);
        assert!(!debouncer.fire(Instant::now()));
    }
}
