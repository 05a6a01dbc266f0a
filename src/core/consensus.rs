use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

use crate::core::config::StabilizerConfig;
use crate::models::prediction::{ConsensusResult, Prediction};

/// Majority vote over a short sliding window of predictions.
///
/// Per-frame inference on live video misclassifies transiently; voting
/// over the last few predictions absorbs that noise without adding
/// perceptible latency. The window is bounded two ways: by entry count
/// and by age relative to the newest prediction.
pub struct ConsensusFilter {
    window: usize,
    horizon: Duration,
    agreement_threshold: f32,
    min_confidence: f32,
    history: VecDeque<Prediction>,
}

impl ConsensusFilter {
    pub fn new(config: &StabilizerConfig) -> Self {
        Self {
            window: config.history_window,
            horizon: Duration::from_millis(config.history_horizon_ms),
            agreement_threshold: config.agreement_threshold,
            min_confidence: config.min_confidence,
            history: VecDeque::new(),
        }
    }

    /// Fold one prediction into the window and recompute consensus.
    ///
    /// Returns None when no symbol clears both the agreement threshold
    /// and the confidence floor. The history is kept either way; a
    /// rejected round is not a reset.
    pub fn observe(&mut self, prediction: Prediction) -> Option<ConsensusResult> {
        let now = prediction.observed_at;
        self.history.push_back(prediction);

        // Age eviction, measured against the newest prediction
        while let Some(oldest) = self.history.front() {
            if now.duration_since(oldest.observed_at) > self.horizon {
                self.history.pop_front();
            } else {
                break;
            }
        }

        // Capacity eviction, oldest first
        while self.history.len() > self.window {
            self.history.pop_front();
        }

        self.compute()
    }

    fn compute(&self) -> Option<ConsensusResult> {
        if self.history.is_empty() {
            return None;
        }

        // Group by symbol in first-seen order: (symbol, votes, confidence sum)
        let mut groups: Vec<(&str, usize, f32)> = Vec::new();
        for prediction in &self.history {
            match groups.iter_mut().find(|(s, _, _)| *s == prediction.symbol) {
                Some(group) => {
                    group.1 += 1;
                    group.2 += prediction.confidence;
                }
                None => groups.push((&prediction.symbol, 1, prediction.confidence)),
            }
        }

        // Most votes wins; ties fall to higher mean confidence, then to
        // whichever symbol appeared first
        let mut best = 0;
        for i in 1..groups.len() {
            let (_, votes, sum) = groups[i];
            let (_, best_votes, best_sum) = groups[best];
            let mean = sum / votes as f32;
            let best_mean = best_sum / best_votes as f32;
            if votes > best_votes || (votes == best_votes && mean > best_mean) {
                best = i;
            }
        }

        let (symbol, vote_count, confidence_sum) = groups[best];
        let total_count = self.history.len();
        let agreement_ratio = vote_count as f32 / total_count as f32;
        let average_confidence = confidence_sum / vote_count as f32;

        if agreement_ratio < self.agreement_threshold {
            debug!(
                "No consensus: {} leads with {}/{} votes (ratio {:.2})",
                symbol, vote_count, total_count, agreement_ratio
            );
            return None;
        }

        if average_confidence < self.min_confidence {
            debug!(
                "No consensus: {} agreed but mean confidence {:.2} is below floor",
                symbol, average_confidence
            );
            return None;
        }

        Some(ConsensusResult {
            symbol: symbol.to_string(),
            average_confidence,
            agreement_ratio,
            vote_count,
            total_count,
        })
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
