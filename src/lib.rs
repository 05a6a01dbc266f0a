// signstream: temporal stabilization for fingerspelled sign recognition.
// Turns a noisy per-frame hand-pose classification stream into a stable,
// append-only transcript via consensus voting and hold-to-commit timing.

pub mod core;
pub mod models;

pub use crate::core::classifier::{ClassifierDispatcher, NullClassifier, SymbolClassifier};
pub use crate::core::config::StabilizerConfig;
pub use crate::core::consensus::ConsensusFilter;
pub use crate::core::hold_commit::{HoldCommitMachine, HoldEffect, HoldState};
pub use crate::core::normalizer::normalize_landmarks;
pub use crate::core::recognition_engine::{
    EngineStats, EngineStatus, FrameDisposition, RecognitionEngine, StreamStatus,
};
pub use crate::core::stream_session::{SessionUpdate, StreamSession};
pub use crate::core::watchdog::{PresenceWatchdog, WatchdogVerdict};
pub use crate::models::hand::{
    Handedness, HandLandmark, Keypoint3D, LandmarkSet, StreamKind, TrackingFrame, LANDMARK_COUNT,
};
pub use crate::models::prediction::{
    ClassifierResponse, ClassifyOutcome, ConsensusResult, FeatureVector, Prediction,
    RecognitionError, RecognitionResult, FEATURE_DIM,
};
pub use crate::models::transcript::{CommittedSymbol, Transcript, SPACE_SYMBOL};
