use std::time::Instant;

use crate::core::config::StabilizerConfig;
use crate::core::consensus::ConsensusFilter;
use crate::core::hold_commit::{HoldCommitMachine, HoldEffect, HoldState};
use crate::models::hand::StreamKind;
use crate::models::prediction::ClassifyOutcome;

/// What one classification round did to a session
#[derive(Debug, Default)]
pub struct SessionUpdate {
    /// Symbol committed this round, if the hold completed
    pub committed: Option<String>,
    /// A prediction arrived but consensus rejected it
    pub consensus_rejected: bool,
}

/// One gesture stream's consensus window and hold machine.
///
/// Single-hand and two-hand streams each own one of these; they share
/// no state, so a commit on one never disturbs the other's hold.
pub struct StreamSession {
    kind: StreamKind,
    filter: ConsensusFilter,
    machine: HoldCommitMachine,
}

impl StreamSession {
    pub fn new(kind: StreamKind, config: &StabilizerConfig) -> Self {
        Self {
            kind,
            filter: ConsensusFilter::new(config),
            machine: HoldCommitMachine::new(config),
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Fold one classification outcome into the session
    pub fn apply_outcome(&mut self, outcome: ClassifyOutcome, now: Instant) -> SessionUpdate {
        let mut update = SessionUpdate::default();

        match outcome {
            ClassifyOutcome::Predicted(prediction) => {
                match self.filter.observe(prediction) {
                    Some(consensus) => {
                        if let HoldEffect::Commit { symbol } =
                            self.machine.on_consensus(&consensus.symbol, now)
                        {
                            update.committed = Some(symbol);
                        }
                    }
                    None => {
                        // Rejected rounds break the hold but keep the
                        // prediction history
                        update.consensus_rejected = true;
                        self.machine.on_no_consensus(now);
                    }
                }
            }
            ClassifyOutcome::Unavailable => {
                self.machine.on_no_consensus(now);
            }
        }

        update
    }

    /// Drop all history and return the machine to idle
    pub fn reset(&mut self) {
        self.filter.clear();
        self.machine.reset();
    }

    pub fn hold_state(&self) -> &HoldState {
        self.machine.state()
    }

    pub fn candidate(&self) -> Option<&str> {
        self.machine.candidate()
    }

    pub fn progress(&self, now: Instant) -> f32 {
        self.machine.progress(now)
    }

    pub fn history_len(&self) -> usize {
        self.filter.len()
    }
}
