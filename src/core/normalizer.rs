use tracing::debug;

use crate::models::hand::{HandLandmark, LandmarkSet, LANDMARK_COUNT};
use crate::models::prediction::{FeatureVector, RecognitionError, RecognitionResult};

/// Convert a raw landmark set into the classifier's feature layout.
///
/// Landmarks are re-based on the wrist, flattened in landmark order as
/// (x, y, z) triples, and scaled so the largest absolute component is 1.
/// The output is invariant under translation and uniform scaling of the
/// input, so camera distance and framing do not leak into the features.
pub fn normalize_landmarks(set: &LandmarkSet) -> RecognitionResult<FeatureVector> {
    if set.landmarks.len() < LANDMARK_COUNT {
        debug!(
            "Skipping malformed landmark set: {} of {} points",
            set.landmarks.len(),
            LANDMARK_COUNT
        );
        return Err(RecognitionError::MalformedLandmarks {
            expected: LANDMARK_COUNT,
            got: set.landmarks.len(),
        });
    }

    let base = set.landmarks[HandLandmark::Wrist as usize];

    let mut values = Vec::with_capacity(LANDMARK_COUNT * 3);
    for point in set.landmarks.iter().take(LANDMARK_COUNT) {
        values.push(point.x - base.x);
        values.push(point.y - base.y);
        values.push(point.z - base.z);
    }

    // Max-abs scaling; all-zero input stays all-zero
    let max_abs = values.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
    if max_abs > 0.0 {
        for value in values.iter_mut() {
            *value /= max_abs;
        }
    }

    Ok(FeatureVector::new(values))
}
