// Data models for hand tracking input

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Number of keypoints the tracking collaborator reports per hand
pub const LANDMARK_COUNT: usize = 21;

// ==============================================================================
// Shared: 3D Keypoint
// ==============================================================================

/// A 3D keypoint in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint3D {
    pub x: f32, // Normalized [0, 1] for image coordinates
    pub y: f32, // Normalized [0, 1] for image coordinates
    pub z: f32, // Depth relative to the wrist, roughly the same scale as x
}

impl Keypoint3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

// ==============================================================================
// Hand Tracking (21 keypoints per hand)
// ==============================================================================

/// MediaPipe Hand Landmark indices (21 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexFingerMcp = 5,
    IndexFingerPip = 6,
    IndexFingerDip = 7,
    IndexFingerTip = 8,
    MiddleFingerMcp = 9,
    MiddleFingerPip = 10,
    MiddleFingerDip = 11,
    MiddleFingerTip = 12,
    RingFingerMcp = 13,
    RingFingerPip = 14,
    RingFingerDip = 15,
    RingFingerTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn to_string(&self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
        }
    }
}

/// One tracked hand in one frame: an ordered set of keypoints plus the
/// handedness label assigned by the tracking collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub handedness: Handedness,
    pub landmarks: Vec<Keypoint3D>, // 21 entries when well-formed
}

impl LandmarkSet {
    pub fn new(handedness: Handedness, landmarks: Vec<Keypoint3D>) -> Self {
        Self {
            handedness,
            landmarks,
        }
    }
}

// ==============================================================================
// Gesture Streams
// ==============================================================================

/// Which gesture pipeline a frame feeds, selected by detected hand count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    SingleHand,
    TwoHand,
}

impl StreamKind {
    pub fn to_string(&self) -> &'static str {
        match self {
            StreamKind::SingleHand => "single_hand",
            StreamKind::TwoHand => "two_hand",
        }
    }

    /// Map a frame's hand count onto a stream; zero hands feed neither
    pub fn for_hand_count(count: usize) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(StreamKind::SingleHand),
            _ => Some(StreamKind::TwoHand),
        }
    }
}

// ==============================================================================
// Tracking Frame
// ==============================================================================

/// All hands reported by the tracking collaborator for a single frame
///
/// The capture time is monotonic and drives every temporal decision in
/// the pipeline, so a recorded frame sequence replays deterministically.
#[derive(Debug, Clone)]
pub struct TrackingFrame {
    pub hands: Vec<LandmarkSet>,
    pub captured_at: Instant,
}

impl TrackingFrame {
    pub fn new(hands: Vec<LandmarkSet>, captured_at: Instant) -> Self {
        Self { hands, captured_at }
    }

    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }

    /// The first reported hand; the only one the pipeline classifies
    pub fn primary_hand(&self) -> Option<&LandmarkSet> {
        self.hands.first()
    }

    pub fn stream_kind(&self) -> Option<StreamKind> {
        StreamKind::for_hand_count(self.hands.len())
    }
}
