use std::time::{Duration, Instant};
use tracing::debug;

use crate::core::config::StabilizerConfig;

/// Hold-commit machine state
#[derive(Debug, Clone, PartialEq)]
pub enum HoldState {
    /// No candidate symbol
    Idle,
    /// A consensus symbol is being held toward commit
    Holding { symbol: String, since: Instant },
    /// A symbol was just committed; same symbol is suppressed until `until`
    Cooldown { symbol: String, until: Instant },
}

impl HoldState {
    pub fn name(&self) -> &'static str {
        match self {
            HoldState::Idle => "idle",
            HoldState::Holding { .. } => "holding",
            HoldState::Cooldown { .. } => "cooldown",
        }
    }
}

/// Side effect of a transition
#[derive(Debug, Clone, PartialEq)]
pub enum HoldEffect {
    None,
    Commit { symbol: String },
}

/// Tracks how long one consensus symbol has been sustained and emits a
/// single commit per sustained run.
///
/// Transitions are pure functions of (state, event, now); the caller
/// supplies frame time, so behavior is deterministic under test. After a
/// commit the machine sits in cooldown: the same symbol is ignored until
/// the cooldown expires, while a different symbol starts a new hold
/// immediately.
pub struct HoldCommitMachine {
    state: HoldState,
    hold_delay: Duration,
    cooldown: Duration,
    stale_after: Duration,
    last_event_at: Option<Instant>,
}

impl HoldCommitMachine {
    pub fn new(config: &StabilizerConfig) -> Self {
        Self {
            state: HoldState::Idle,
            hold_delay: Duration::from_millis(config.hold_delay_ms),
            cooldown: Duration::from_millis(config.cooldown_ms),
            stale_after: Duration::from_millis(config.history_horizon_ms),
            last_event_at: None,
        }
    }

    /// Feed one consensus symbol observed at `now`
    pub fn on_consensus(&mut self, symbol: &str, now: Instant) -> HoldEffect {
        let gap_exceeded = self.observation_gap_exceeded(now);
        self.last_event_at = Some(now);

        let previous = std::mem::replace(&mut self.state, HoldState::Idle);
        let (next, effect) = match previous {
            HoldState::Holding { symbol: held, since } if held == symbol => {
                if gap_exceeded {
                    // The hold predates an observation gap; its start time
                    // no longer reflects sustained consensus
                    debug!("Restarting hold on '{}' after observation gap", held);
                    (
                        HoldState::Holding {
                            symbol: held,
                            since: now,
                        },
                        HoldEffect::None,
                    )
                } else if now.duration_since(since) >= self.hold_delay {
                    debug!("Hold on '{}' complete, committing", held);
                    (
                        HoldState::Cooldown {
                            symbol: held.clone(),
                            until: now + self.cooldown,
                        },
                        HoldEffect::Commit { symbol: held },
                    )
                } else {
                    (HoldState::Holding { symbol: held, since }, HoldEffect::None)
                }
            }
            HoldState::Cooldown {
                symbol: committed,
                until,
            } if committed == symbol && now < until => (
                HoldState::Cooldown {
                    symbol: committed,
                    until,
                },
                HoldEffect::None,
            ),
            _ => {
                // Idle, an expired cooldown, or a different symbol all
                // start a fresh hold
                debug!("Holding '{}'", symbol);
                (
                    HoldState::Holding {
                        symbol: symbol.to_string(),
                        since: now,
                    },
                    HoldEffect::None,
                )
            }
        };

        self.state = next;
        effect
    }

    /// Feed one round with no consensus; any in-progress hold is discarded
    pub fn on_no_consensus(&mut self, now: Instant) {
        self.last_event_at = Some(now);
        if self.state != HoldState::Idle {
            debug!("Consensus lost, dropping {} state", self.state.name());
            self.state = HoldState::Idle;
        }
    }

    /// Force the machine back to idle
    pub fn reset(&mut self) {
        self.state = HoldState::Idle;
        self.last_event_at = None;
    }

    pub fn state(&self) -> &HoldState {
        &self.state
    }

    /// The symbol currently held or cooling down, if any
    pub fn candidate(&self) -> Option<&str> {
        match &self.state {
            HoldState::Idle => None,
            HoldState::Holding { symbol, .. } => Some(symbol),
            HoldState::Cooldown { symbol, .. } => Some(symbol),
        }
    }

    /// Fraction of the hold delay elapsed, in [0, 1]
    pub fn progress(&self, now: Instant) -> f32 {
        match &self.state {
            HoldState::Holding { since, .. } => {
                let elapsed = now.duration_since(*since).as_secs_f32();
                (elapsed / self.hold_delay.as_secs_f32()).min(1.0)
            }
            _ => 0.0,
        }
    }

    fn observation_gap_exceeded(&self, now: Instant) -> bool {
        match self.last_event_at {
            Some(last) => now.duration_since(last) > self.stale_after,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(hold_ms: u64, cooldown_ms: u64) -> HoldCommitMachine {
        HoldCommitMachine::new(&StabilizerConfig {
            hold_delay_ms: hold_ms,
            cooldown_ms,
            ..StabilizerConfig::default()
        })
    }

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    #[test]
    fn test_first_consensus_starts_holding() {
        let mut m = machine(2000, 1000);
        let t0 = Instant::now();

        let effect = m.on_consensus("m", at(t0, 0));
        assert_eq!(effect, HoldEffect::None);
        assert_eq!(m.state().name(), "holding");
        assert_eq!(m.candidate(), Some("m"));
    }

    #[test]
    fn test_progress_tracks_elapsed_hold() {
        let mut m = machine(2000, 1000);
        let t0 = Instant::now();

        m.on_consensus("m", at(t0, 0));
        assert!((m.progress(at(t0, 0)) - 0.0).abs() < 1e-6);
        assert!((m.progress(at(t0, 500)) - 0.25).abs() < 1e-6);
        assert!((m.progress(at(t0, 1000)) - 0.5).abs() < 1e-6);
        // Capped at 1.0 past the delay
        assert!((m.progress(at(t0, 3000)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_commit_fires_once_hold_delay_elapses() {
        let mut m = machine(2000, 1000);
        let t0 = Instant::now();

        m.on_consensus("m", at(t0, 0));
        assert_eq!(m.on_consensus("m", at(t0, 500)), HoldEffect::None);
        assert_eq!(m.on_consensus("m", at(t0, 1900)), HoldEffect::None);
        assert_eq!(
            m.on_consensus("m", at(t0, 2000)),
            HoldEffect::Commit {
                symbol: "m".to_string()
            }
        );
        assert_eq!(m.state().name(), "cooldown");
    }

    #[test]
    fn test_cooldown_suppresses_repeat_commit() {
        let mut m = machine(2000, 1000);
        let t0 = Instant::now();

        m.on_consensus("m", at(t0, 0));
        m.on_consensus("m", at(t0, 2000));

        // Same symbol inside the cooldown window does nothing
        assert_eq!(m.on_consensus("m", at(t0, 2100)), HoldEffect::None);
        assert_eq!(m.on_consensus("m", at(t0, 2900)), HoldEffect::None);
        assert_eq!(m.state().name(), "cooldown");
    }

    #[test]
    fn test_cooldown_expiry_starts_fresh_hold() {
        let mut m = machine(2000, 1000);
        let t0 = Instant::now();

        m.on_consensus("m", at(t0, 0));
        m.on_consensus("m", at(t0, 2000)); // commits, cooldown until 3000

        assert_eq!(m.on_consensus("m", at(t0, 3000)), HoldEffect::None);
        assert_eq!(m.state().name(), "holding");

        // Second sustained run commits again
        assert_eq!(
            m.on_consensus("m", at(t0, 5000)),
            HoldEffect::Commit {
                symbol: "m".to_string()
            }
        );
    }

    #[test]
    fn test_different_symbol_during_cooldown_holds_immediately() {
        let mut m = machine(2000, 1000);
        let t0 = Instant::now();

        m.on_consensus("m", at(t0, 0));
        m.on_consensus("m", at(t0, 2000)); // commits, cooldown until 3000

        assert_eq!(m.on_consensus("n", at(t0, 2200)), HoldEffect::None);
        assert_eq!(m.state().name(), "holding");
        assert_eq!(m.candidate(), Some("n"));
    }

    #[test]
    fn test_symbol_switch_discards_hold() {
        let mut m = machine(2000, 1000);
        let t0 = Instant::now();

        m.on_consensus("m", at(t0, 0));
        assert_eq!(m.on_consensus("n", at(t0, 800)), HoldEffect::None);
        assert_eq!(m.candidate(), Some("n"));

        // The new hold counts from the switch, not from the start of "m"
        assert_eq!(m.on_consensus("n", at(t0, 2000)), HoldEffect::None);
        assert_eq!(
            m.on_consensus("n", at(t0, 2800)),
            HoldEffect::Commit {
                symbol: "n".to_string()
            }
        );
    }

    #[test]
    fn test_no_consensus_forces_idle() {
        let mut m = machine(2000, 1000);
        let t0 = Instant::now();

        m.on_consensus("m", at(t0, 0));
        m.on_no_consensus(at(t0, 500));
        assert_eq!(m.state(), &HoldState::Idle);
        assert_eq!(m.candidate(), None);

        // From cooldown as well
        m.on_consensus("m", at(t0, 1000));
        m.on_consensus("m", at(t0, 3000));
        assert_eq!(m.state().name(), "cooldown");
        m.on_no_consensus(at(t0, 3100));
        assert_eq!(m.state(), &HoldState::Idle);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut m = machine(2000, 1000);
        let t0 = Instant::now();

        m.on_consensus("m", at(t0, 0));
        m.reset();
        assert_eq!(m.state(), &HoldState::Idle);
        assert_eq!(m.progress(at(t0, 100)), 0.0);
    }

    #[test]
    fn test_observation_gap_restarts_hold() {
        let mut m = machine(2000, 1000);
        let t0 = Instant::now();

        m.on_consensus("m", at(t0, 0));
        m.on_consensus("m", at(t0, 300));

        // Nothing observed for well past the horizon; the old hold must
        // not commit instantly when the symbol reappears
        let effect = m.on_consensus("m", at(t0, 10_000));
        assert_eq!(effect, HoldEffect::None);
        assert_eq!(m.state().name(), "holding");

        assert_eq!(
            m.on_consensus("m", at(t0, 12_000)),
            HoldEffect::Commit {
                symbol: "m".to_string()
            }
        );
    }

    #[test]
    fn test_exactly_one_commit_per_sustained_run() {
        let mut m = machine(2000, 1000);
        let t0 = Instant::now();

        let mut commits = 0;
        for ms in (0..=2400).step_by(100) {
            if let HoldEffect::Commit { .. } = m.on_consensus("m", at(t0, ms)) {
                commits += 1;
            }
        }
        assert_eq!(commits, 1);
    }
}
