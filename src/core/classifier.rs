// Symbol classification seam
// Routes feature vectors to the classifier registered for each hand

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::models::hand::Handedness;
use crate::models::prediction::{
    ClassifierResponse, ClassifyOutcome, FeatureVector, Prediction, RecognitionError,
    RecognitionResult,
};

/// Symbol classifier trait
/// Implement this for whatever model backend serves the predictions
#[async_trait]
pub trait SymbolClassifier: Send + Sync {
    /// Run inference on one feature vector
    async fn classify(&self, features: &FeatureVector) -> RecognitionResult<ClassifierResponse>;

    /// Check if the model is loaded and able to serve
    fn is_ready(&self) -> bool;

    /// Get model info
    fn model_info(&self) -> String;
}

// ==============================================================================
// Dispatcher
// ==============================================================================

/// Routes classification requests by handedness.
///
/// A hand with no registered classifier, a classifier that reports not
/// ready, and a classifier that errors all produce `Unavailable` rather
/// than an error; the pipeline treats that as a distinguished outcome,
/// not a failure.
#[derive(Default)]
pub struct ClassifierDispatcher {
    classifiers: HashMap<Handedness, Arc<dyn SymbolClassifier>>,
}

impl ClassifierDispatcher {
    pub fn new() -> Self {
        Self {
            classifiers: HashMap::new(),
        }
    }

    /// Register the classifier used for one hand, replacing any previous one
    pub fn register(&mut self, handedness: Handedness, classifier: Arc<dyn SymbolClassifier>) {
        self.classifiers.insert(handedness, classifier);
    }

    /// True if a ready classifier is registered for this hand
    pub fn is_available(&self, handedness: Handedness) -> bool {
        self.classifiers
            .get(&handedness)
            .map(|c| c.is_ready())
            .unwrap_or(false)
    }

    /// Classify one feature vector, stamping the result with when the
    /// source frame was captured
    pub async fn dispatch(
        &self,
        features: &FeatureVector,
        handedness: Handedness,
        observed_at: Instant,
    ) -> ClassifyOutcome {
        let classifier = match self.classifiers.get(&handedness) {
            Some(c) => c,
            None => {
                debug!(
                    "No classifier registered for {} hand",
                    handedness.to_string()
                );
                return ClassifyOutcome::Unavailable;
            }
        };

        if !classifier.is_ready() {
            debug!(
                "Classifier for {} hand is not ready: {}",
                handedness.to_string(),
                classifier.model_info()
            );
            return ClassifyOutcome::Unavailable;
        }

        match classifier.classify(features).await {
            Ok(response) => ClassifyOutcome::Predicted(Prediction::new(
                response.symbol,
                response.confidence,
                observed_at,
            )),
            Err(e) => {
                warn!("Classification failed for {} hand: {}", handedness.to_string(), e);
                ClassifyOutcome::Unavailable
            }
        }
    }
}

// ==============================================================================
// Null Implementation (for running without a model)
// ==============================================================================

/// Placeholder classifier that is never ready
pub struct NullClassifier;

#[async_trait]
impl SymbolClassifier for NullClassifier {
    async fn classify(&self, _features: &FeatureVector) -> RecognitionResult<ClassifierResponse> {
        Err(RecognitionError::ClassifierUnavailable(
            "no model loaded".to_string(),
        ))
    }

    fn is_ready(&self) -> bool {
        false
    }

    fn model_info(&self) -> String {
        "Null classifier (no model)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::prediction::FEATURE_DIM;

    /// Test classifier that always returns the same response
    struct FixedClassifier {
        symbol: &'static str,
        confidence: f32,
        fail: bool,
    }

    #[async_trait]
    impl SymbolClassifier for FixedClassifier {
        async fn classify(
            &self,
            _features: &FeatureVector,
        ) -> RecognitionResult<ClassifierResponse> {
            if self.fail {
                return Err(RecognitionError::InferenceFailed("simulated".to_string()));
            }
            Ok(ClassifierResponse {
                symbol: self.symbol.to_string(),
                confidence: self.confidence,
            })
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn model_info(&self) -> String {
            format!("Fixed classifier ({})", self.symbol)
        }
    }

    fn test_features() -> FeatureVector {
        FeatureVector::new(vec![0.0; FEATURE_DIM])
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_handedness() {
        let mut dispatcher = ClassifierDispatcher::new();
        dispatcher.register(
            Handedness::Left,
            Arc::new(FixedClassifier {
                symbol: "a",
                confidence: 0.9,
                fail: false,
            }),
        );
        dispatcher.register(
            Handedness::Right,
            Arc::new(FixedClassifier {
                symbol: "b",
                confidence: 0.8,
                fail: false,
            }),
        );

        let now = Instant::now();
        let features = test_features();

        match dispatcher.dispatch(&features, Handedness::Left, now).await {
            ClassifyOutcome::Predicted(p) => {
                assert_eq!(p.symbol, "a");
                assert_eq!(p.confidence, 0.9);
                assert_eq!(p.observed_at, now);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        match dispatcher.dispatch(&features, Handedness::Right, now).await {
            ClassifyOutcome::Predicted(p) => assert_eq!(p.symbol, "b"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unregistered_hand_is_unavailable() {
        let dispatcher = ClassifierDispatcher::new();
        let outcome = dispatcher
            .dispatch(&test_features(), Handedness::Left, Instant::now())
            .await;
        assert_eq!(outcome, ClassifyOutcome::Unavailable);
        assert!(!dispatcher.is_available(Handedness::Left));
    }

    #[tokio::test]
    async fn test_classifier_error_becomes_unavailable() {
        let mut dispatcher = ClassifierDispatcher::new();
        dispatcher.register(
            Handedness::Right,
            Arc::new(FixedClassifier {
                symbol: "x",
                confidence: 0.9,
                fail: true,
            }),
        );

        let outcome = dispatcher
            .dispatch(&test_features(), Handedness::Right, Instant::now())
            .await;
        assert_eq!(outcome, ClassifyOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_null_classifier_is_never_ready() {
        let mut dispatcher = ClassifierDispatcher::new();
        dispatcher.register(Handedness::Left, Arc::new(NullClassifier));

        assert!(!dispatcher.is_available(Handedness::Left));
        let outcome = dispatcher
            .dispatch(&test_features(), Handedness::Left, Instant::now())
            .await;
        assert_eq!(outcome, ClassifyOutcome::Unavailable);
    }
}
