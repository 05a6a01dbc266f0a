// Data models for classifier output and consensus computation

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Length of a normalized feature vector (21 keypoints x 3 axes)
pub const FEATURE_DIM: usize = 63;

// ==============================================================================
// Feature Vector
// ==============================================================================

/// Canonical, scale- and translation-invariant representation of one hand,
/// flattened as [x0, y0, z0, x1, y1, z1, ...]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: Vec<f32>, // FEATURE_DIM entries
}

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ==============================================================================
// Predictions
// ==============================================================================

/// Raw classifier response, before the pipeline stamps frame timing onto it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierResponse {
    pub symbol: String,
    pub confidence: f32, // [0, 1]
}

/// A single classifier output for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub symbol: String,
    pub confidence: f32,      // [0, 1]
    pub observed_at: Instant, // Monotonic time of the frame that produced it
}

impl Prediction {
    pub fn new(symbol: impl Into<String>, confidence: f32, observed_at: Instant) -> Self {
        Self {
            symbol: symbol.into(),
            confidence,
            observed_at,
        }
    }
}

/// Result of dispatching one feature vector to a classifier
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifyOutcome {
    /// The classifier produced a labeled prediction
    Predicted(Prediction),
    /// No classifier is loaded for the requested handedness, or the call
    /// failed; the frame degrades to a "no consensus" observation
    Unavailable,
}

// ==============================================================================
// Consensus
// ==============================================================================

/// Majority-vote result over the retained prediction history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub symbol: String,
    pub average_confidence: f32,
    pub agreement_ratio: f32,
    pub vote_count: usize,
    pub total_count: usize,
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("Recognition engine not running")]
    NotRunning,

    #[error("Recognition engine already running")]
    AlreadyRunning,

    #[error("Malformed landmark set: expected {expected} points, got {got}")]
    MalformedLandmarks { expected: usize, got: usize },

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type RecognitionResult<T> = Result<T, RecognitionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_construction() {
        let at = Instant::now();
        let prediction = Prediction::new("a", 0.92, at);
        assert_eq!(prediction.symbol, "a");
        assert_eq!(prediction.confidence, 0.92);
        assert_eq!(prediction.observed_at, at);
    }

    #[test]
    fn test_feature_vector_len() {
        let features = FeatureVector::new(vec![0.0; FEATURE_DIM]);
        assert_eq!(features.len(), FEATURE_DIM);
        assert!(!features.is_empty());
    }

    #[test]
    fn test_consensus_result_serialization() {
        let consensus = ConsensusResult {
            symbol: "b".to_string(),
            average_confidence: 0.9,
            agreement_ratio: 0.8,
            vote_count: 4,
            total_count: 5,
        };

        let json = serde_json::to_string(&consensus).unwrap();
        let back: ConsensusResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, consensus);
    }

    #[test]
    fn test_error_display() {
        let err = RecognitionError::MalformedLandmarks {
            expected: 21,
            got: 4,
        };
        assert_eq!(
            err.to_string(),
            "Malformed landmark set: expected 21 points, got 4"
        );
    }
}
