//! Trailing-edge debouncer with injected time
//!
//! Works on any clock: callers pass the elapsed time since an origin of
//! their choosing (`performance.now()` in the browser, `Instant` natively).

use std::time::Duration;

/// Delay used for window resizes
pub const RESIZE_DELAY: Duration = Duration::from_millis(200);

/// Fires once after a burst of events has been quiet for `delay`
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    last_event: Option<Duration>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(RESIZE_DELAY)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_event: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record an event at `now`
    pub fn event(&mut self, now: Duration) {
        self.last_event = Some(now);
    }

    /// Whether a burst is waiting to fire
    pub fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }

    /// Time left before the pending burst fires
    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        self.last_event
            .map(|last| (last + self.delay).saturating_sub(now))
    }

    /// Returns true exactly once per burst, when the quiet period has elapsed
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.last_event {
            Some(last) if now.saturating_sub(last) >= self.delay => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_fires_once_per_burst() {
        let mut debouncer = Debouncer::default();
        for t in [0, 50, 120, 250] {
            debouncer.event(ms(t));
            assert!(!debouncer.poll(ms(t + 10)));
        }

        assert!(!debouncer.poll(ms(449)));
        assert!(debouncer.poll(ms(450)));
        assert!(!debouncer.poll(ms(460)));
        assert!(!debouncer.poll(ms(10_000)));
    }

    #[test]
    fn test_remaining() {
        let mut debouncer = Debouncer::new(ms(200));
        assert_eq!(debouncer.remaining(ms(0)), None);

        debouncer.event(ms(100));
        assert_eq!(debouncer.remaining(ms(150)), Some(ms(150)));
        assert_eq!(debouncer.remaining(ms(400)), Some(Duration::ZERO));
        assert!(debouncer.is_pending());
    }
}
