use std::time::{Duration, Instant};
use tracing::debug;

use crate::core::config::StabilizerConfig;

/// What the watchdog concluded from one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogVerdict {
    /// At least one hand is tracked
    HandsPresent,
    /// No hands, but the absence is still shorter than the reset window
    AbsencePending,
    /// Absence crossed the reset window; caller must reset the pipeline
    ResetRequired,
    /// Reset already fired for this absence run
    AlreadyReset,
}

/// Watches for prolonged zero-hand stretches in the frame stream.
///
/// Fires `ResetRequired` exactly once per absence run, at the first
/// frame where the absence has lasted at least the configured window.
/// Any frame with a hand re-arms it.
pub struct PresenceWatchdog {
    reset_after: Duration,
    absent_since: Option<Instant>,
    reset_fired: bool,
}

impl PresenceWatchdog {
    pub fn new(config: &StabilizerConfig) -> Self {
        Self {
            reset_after: Duration::from_millis(config.absence_reset_ms),
            absent_since: None,
            reset_fired: false,
        }
    }

    /// Feed the hand count of one frame captured at `now`
    pub fn observe(&mut self, hand_count: usize, now: Instant) -> WatchdogVerdict {
        if hand_count > 0 {
            self.absent_since = None;
            self.reset_fired = false;
            return WatchdogVerdict::HandsPresent;
        }

        let since = *self.absent_since.get_or_insert(now);
        if now.duration_since(since) < self.reset_after {
            return WatchdogVerdict::AbsencePending;
        }

        if self.reset_fired {
            return WatchdogVerdict::AlreadyReset;
        }

        debug!(
            "No hands for {} ms, requesting pipeline reset",
            now.duration_since(since).as_millis()
        );
        self.reset_fired = true;
        WatchdogVerdict::ResetRequired
    }

    pub fn reset(&mut self) {
        self.absent_since = None;
        self.reset_fired = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watchdog(reset_ms: u64) -> PresenceWatchdog {
        PresenceWatchdog::new(&StabilizerConfig {
            absence_reset_ms: reset_ms,
            ..StabilizerConfig::default()
        })
    }

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    #[test]
    fn test_short_absence_is_pending() {
        let mut w = watchdog(500);
        let t0 = Instant::now();

        assert_eq!(w.observe(1, at(t0, 0)), WatchdogVerdict::HandsPresent);
        assert_eq!(w.observe(0, at(t0, 100)), WatchdogVerdict::AbsencePending);
        assert_eq!(w.observe(0, at(t0, 400)), WatchdogVerdict::AbsencePending);
    }

    #[test]
    fn test_reset_fires_at_threshold() {
        let mut w = watchdog(500);
        let t0 = Instant::now();

        assert_eq!(w.observe(0, at(t0, 0)), WatchdogVerdict::AbsencePending);
        assert_eq!(w.observe(0, at(t0, 499)), WatchdogVerdict::AbsencePending);
        assert_eq!(w.observe(0, at(t0, 500)), WatchdogVerdict::ResetRequired);
    }

    #[test]
    fn test_reset_fires_only_once_per_absence() {
        let mut w = watchdog(500);
        let t0 = Instant::now();

        w.observe(0, at(t0, 0));
        assert_eq!(w.observe(0, at(t0, 600)), WatchdogVerdict::ResetRequired);
        assert_eq!(w.observe(0, at(t0, 700)), WatchdogVerdict::AlreadyReset);
        assert_eq!(w.observe(0, at(t0, 5000)), WatchdogVerdict::AlreadyReset);
    }

    #[test]
    fn test_reappearance_rearms() {
        let mut w = watchdog(500);
        let t0 = Instant::now();

        w.observe(0, at(t0, 0));
        assert_eq!(w.observe(0, at(t0, 600)), WatchdogVerdict::ResetRequired);

        assert_eq!(w.observe(2, at(t0, 700)), WatchdogVerdict::HandsPresent);
        assert_eq!(w.observe(0, at(t0, 800)), WatchdogVerdict::AbsencePending);
        assert_eq!(w.observe(0, at(t0, 1300)), WatchdogVerdict::ResetRequired);
    }

    #[test]
    fn test_manual_reset_rearms() {
        let mut w = watchdog(500);
        let t0 = Instant::now();

        w.observe(0, at(t0, 0));
        w.observe(0, at(t0, 600));
        w.reset();

        assert_eq!(w.observe(0, at(t0, 700)), WatchdogVerdict::AbsencePending);
    }
}
