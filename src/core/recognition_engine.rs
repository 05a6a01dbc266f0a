// Recognition engine
// Orchestrates the per-frame pipeline: watchdog, normalization, throttled
// classification, consensus, hold-commit, transcript

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::classifier::ClassifierDispatcher;
use crate::core::config::StabilizerConfig;
use crate::core::normalizer::normalize_landmarks;
use crate::core::stream_session::StreamSession;
use crate::core::watchdog::{PresenceWatchdog, WatchdogVerdict};
use crate::models::hand::{Handedness, StreamKind, TrackingFrame};
use crate::models::prediction::{
    ClassifyOutcome, FeatureVector, RecognitionError, RecognitionResult,
};
use crate::models::transcript::{CommittedSymbol, Transcript};

// ==============================================================================
// Status DTOs
// ==============================================================================

/// What the engine did with one submitted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameDisposition {
    /// Frame accepted; a classification request is in flight
    Submitted,
    /// Frame carried no hands; watchdog bookkeeping only
    NoHands,
    /// Primary landmark set was malformed and skipped
    Malformed,
    /// Discarded by the inter-request throttle
    Throttled,
}

/// Advisory pipeline counters, reset by `clear`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub frames_received: u64,
    pub frames_no_hands: u64,
    pub frames_malformed: u64,
    pub frames_throttled: u64,
    pub requests_dispatched: u64,
    pub requests_completed: u64,
    pub stale_results_discarded: u64,
    pub unavailable_responses: u64,
    pub low_agreement_rejections: u64,
    pub watchdog_resets: u64,
    pub commits: u64,
}

/// Live view of one stream session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamStatus {
    pub state: String, // "idle", "holding", or "cooldown"
    pub candidate: Option<String>,
    pub hold_progress: f32, // Fraction of hold delay elapsed [0, 1]
    pub history_len: usize,
}

/// Point-in-time engine snapshot, derived on demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub running: bool,
    pub run_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub degraded: bool,
    pub single_hand: StreamStatus,
    pub two_hand: StreamStatus,
    pub transcript_len: usize,
    pub stats: EngineStats,
}

// ==============================================================================
// Internal state
// ==============================================================================

/// One queued classification request
#[derive(Debug, Clone)]
struct ClassifyJob {
    stream: StreamKind,
    handedness: Handedness,
    features: FeatureVector,
    observed_at: Instant,
    generation: u64,
}

/// Everything the per-frame pipeline mutates, behind one lock so a frame
/// and a finishing classification never interleave mid-update
struct PipelineState {
    single_hand: StreamSession,
    two_hand: StreamSession,
    watchdog: PresenceWatchdog,
    degraded: bool,
    generation: u64, // bumped on every reset; older in-flight results are stale
}

impl PipelineState {
    fn new(config: &StabilizerConfig) -> Self {
        Self {
            single_hand: StreamSession::new(StreamKind::SingleHand, config),
            two_hand: StreamSession::new(StreamKind::TwoHand, config),
            watchdog: PresenceWatchdog::new(config),
            degraded: false,
            generation: 0,
        }
    }

    fn session_mut(&mut self, kind: StreamKind) -> &mut StreamSession {
        match kind {
            StreamKind::SingleHand => &mut self.single_hand,
            StreamKind::TwoHand => &mut self.two_hand,
        }
    }

    fn reset_sessions(&mut self) {
        self.single_hand.reset();
        self.two_hand.reset();
    }
}

/// Single-request throttle: one in-flight classification, minimum spacing
/// between accepted frames
#[derive(Default)]
struct ThrottleGate {
    in_flight: bool,
    last_accepted: Option<Instant>,
}

// ==============================================================================
// Engine
// ==============================================================================

/// Turns a noisy per-frame prediction stream into a stable transcript.
///
/// Frames go in through `process_frame`; committed symbols come out on the
/// transcript. Classification runs on a dedicated worker task fed by a
/// single-slot mailbox, so frame ingestion never blocks on the model. All
/// temporal decisions key off each frame's capture timestamp, which makes
/// the pipeline deterministic for a given frame sequence.
pub struct RecognitionEngine {
    config: StabilizerConfig,
    dispatcher: Arc<ClassifierDispatcher>,
    state: Arc<RwLock<PipelineState>>,
    transcript: Arc<RwLock<Transcript>>,
    stats: Arc<RwLock<EngineStats>>,
    throttle: Arc<RwLock<ThrottleGate>>,
    is_running: Arc<RwLock<bool>>,
    run_id: Arc<RwLock<Option<String>>>,
    started_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    job_tx: Arc<RwLock<Option<watch::Sender<Option<ClassifyJob>>>>>,
}

impl RecognitionEngine {
    pub fn new(
        config: StabilizerConfig,
        dispatcher: Arc<ClassifierDispatcher>,
    ) -> RecognitionResult<Self> {
        config
            .validate()
            .map_err(|e| RecognitionError::InvalidConfig(e.to_string()))?;

        let state = PipelineState::new(&config);
        Ok(Self {
            config,
            dispatcher,
            state: Arc::new(RwLock::new(state)),
            transcript: Arc::new(RwLock::new(Transcript::new())),
            stats: Arc::new(RwLock::new(EngineStats::default())),
            throttle: Arc::new(RwLock::new(ThrottleGate::default())),
            is_running: Arc::new(RwLock::new(false)),
            run_id: Arc::new(RwLock::new(None)),
            started_at: Arc::new(RwLock::new(None)),
            job_tx: Arc::new(RwLock::new(None)),
        })
    }

    /// Spawn the classification worker and begin accepting frames
    pub async fn start(&self) -> RecognitionResult<()> {
        let mut running = self.is_running.write().await;
        if *running {
            return Err(RecognitionError::AlreadyRunning);
        }

        let id = Uuid::new_v4().to_string();
        *self.run_id.write().await = Some(id.clone());
        *self.started_at.write().await = Some(Utc::now());
        *self.throttle.write().await = ThrottleGate::default();

        let (tx, rx) = watch::channel::<Option<ClassifyJob>>(None);
        *self.job_tx.write().await = Some(tx);

        tokio::spawn(Self::run_classification_worker(
            rx,
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.state),
            Arc::clone(&self.transcript),
            Arc::clone(&self.stats),
            Arc::clone(&self.throttle),
        ));

        *running = true;
        info!("Recognition engine started (run {})", id);
        Ok(())
    }

    /// Tear down the classification worker and stop accepting frames
    pub async fn stop(&self) -> RecognitionResult<()> {
        let mut running = self.is_running.write().await;
        if !*running {
            return Err(RecognitionError::NotRunning);
        }

        // Dropping the sender ends the worker loop
        *self.job_tx.write().await = None;
        *self.run_id.write().await = None;
        *self.started_at.write().await = None;

        // A request still in flight must not touch session state after stop
        self.state.write().await.generation += 1;

        *running = false;
        info!("Recognition engine stopped");
        Ok(())
    }

    /// Ingest one tracking frame. Non-blocking: classification happens on
    /// the worker task, and frames that cannot be classified right now are
    /// discarded, never queued.
    pub async fn process_frame(
        &self,
        frame: TrackingFrame,
    ) -> RecognitionResult<FrameDisposition> {
        if !*self.is_running.read().await {
            return Err(RecognitionError::NotRunning);
        }

        let now = frame.captured_at;
        self.stats.write().await.frames_received += 1;

        // The watchdog sees every frame, including empty ones
        let (reset_fired, generation) = {
            let mut state = self.state.write().await;
            let fired = match state.watchdog.observe(frame.hand_count(), now) {
                WatchdogVerdict::ResetRequired => {
                    state.reset_sessions();
                    state.generation += 1;
                    true
                }
                _ => false,
            };
            (fired, state.generation)
        };
        if reset_fired {
            self.stats.write().await.watchdog_resets += 1;
            info!("Hand absence exceeded reset window, both stream sessions idled");
        }

        let (kind, primary) = match (frame.stream_kind(), frame.primary_hand()) {
            (Some(kind), Some(hand)) => (kind, hand),
            _ => {
                self.stats.write().await.frames_no_hands += 1;
                return Ok(FrameDisposition::NoHands);
            }
        };

        let features = match normalize_landmarks(primary) {
            Ok(features) => features,
            Err(e) => {
                debug!("Skipping frame: {}", e);
                self.stats.write().await.frames_malformed += 1;
                return Ok(FrameDisposition::Malformed);
            }
        };

        // One request at a time, spaced at least the throttle interval apart
        let min_interval = Duration::from_millis(self.config.throttle_interval_ms);
        {
            let mut gate = self.throttle.write().await;
            let too_soon = gate
                .last_accepted
                .map(|last| now.duration_since(last) < min_interval)
                .unwrap_or(false);
            if gate.in_flight || too_soon {
                drop(gate);
                debug!("Discarding frame: classification throttled");
                self.stats.write().await.frames_throttled += 1;
                return Ok(FrameDisposition::Throttled);
            }
            gate.in_flight = true;
            gate.last_accepted = Some(now);
        }

        let job = ClassifyJob {
            stream: kind,
            handedness: primary.handedness,
            features,
            observed_at: now,
            generation,
        };

        let sent = match self.job_tx.read().await.as_ref() {
            Some(tx) => tx.send(Some(job)).is_ok(),
            None => false,
        };
        if !sent {
            self.throttle.write().await.in_flight = false;
            return Err(RecognitionError::NotRunning);
        }

        self.stats.write().await.requests_dispatched += 1;
        Ok(FrameDisposition::Submitted)
    }

    /// Dedicated classification task. Receives jobs from the single-slot
    /// mailbox, runs inference, and folds the outcome back into the owning
    /// stream session using the job's frame timestamp. A result that
    /// finishes after a pipeline reset is stale and gets discarded.
    async fn run_classification_worker(
        mut rx: watch::Receiver<Option<ClassifyJob>>,
        dispatcher: Arc<ClassifierDispatcher>,
        state: Arc<RwLock<PipelineState>>,
        transcript: Arc<RwLock<Transcript>>,
        stats: Arc<RwLock<EngineStats>>,
        throttle: Arc<RwLock<ThrottleGate>>,
    ) {
        while rx.changed().await.is_ok() {
            let job = match rx.borrow_and_update().clone() {
                Some(job) => job,
                None => continue,
            };

            // Classifier implementations run on their own task; a panicking
            // model must not take the worker and its in-flight slot down
            // with it
            let dispatcher = Arc::clone(&dispatcher);
            let features = job.features.clone();
            let handedness = job.handedness;
            let observed_at = job.observed_at;
            let inference = tokio::spawn(async move {
                dispatcher.dispatch(&features, handedness, observed_at).await
            });
            let outcome = match inference.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Classifier task failed: {}", e);
                    ClassifyOutcome::Unavailable
                }
            };
            let unavailable = matches!(outcome, ClassifyOutcome::Unavailable);

            let update = {
                let mut state = state.write().await;
                if job.generation != state.generation {
                    // A reset happened after this frame was captured; its
                    // result is stale
                    debug!(
                        "Discarding stale classification result on {} stream",
                        job.stream.to_string()
                    );
                    None
                } else {
                    if unavailable {
                        if !state.degraded {
                            state.degraded = true;
                            warn!("Classifier unavailable, entering degraded mode");
                        }
                    } else if state.degraded {
                        state.degraded = false;
                        info!("Classifier reachable again, leaving degraded mode");
                    }
                    Some(
                        state
                            .session_mut(job.stream)
                            .apply_outcome(outcome, job.observed_at),
                    )
                }
            };

            {
                let mut stats = stats.write().await;
                stats.requests_completed += 1;
                match &update {
                    None => stats.stale_results_discarded += 1,
                    Some(update) => {
                        if unavailable {
                            stats.unavailable_responses += 1;
                        }
                        if update.consensus_rejected {
                            stats.low_agreement_rejections += 1;
                        }
                        if update.committed.is_some() {
                            stats.commits += 1;
                        }
                    }
                }
            }

            if let Some(symbol) = update.and_then(|u| u.committed) {
                info!(
                    "Committed '{}' on {} stream",
                    symbol,
                    job.stream.to_string()
                );
                transcript.write().await.push(symbol, job.stream);
            }

            throttle.write().await.in_flight = false;
        }

        debug!("Classification worker stopped");
    }

    /// Empty the transcript and idle both stream sessions. Works whether
    /// or not the engine is running.
    pub async fn clear(&self) {
        {
            let mut state = self.state.write().await;
            state.reset_sessions();
            state.watchdog.reset();
            state.generation += 1;
        }
        self.transcript.write().await.clear();
        *self.stats.write().await = EngineStats::default();
        info!("Pipeline cleared");
    }

    /// Snapshot of the whole engine, derived on demand
    pub async fn status(&self) -> EngineStatus {
        let now = Instant::now();
        let state = self.state.read().await;
        EngineStatus {
            running: *self.is_running.read().await,
            run_id: self.run_id.read().await.clone(),
            started_at: *self.started_at.read().await,
            degraded: state.degraded,
            single_hand: Self::stream_status(&state.single_hand, now),
            two_hand: Self::stream_status(&state.two_hand, now),
            transcript_len: self.transcript.read().await.len(),
            stats: *self.stats.read().await,
        }
    }

    fn stream_status(session: &StreamSession, now: Instant) -> StreamStatus {
        StreamStatus {
            state: session.hold_state().name().to_string(),
            candidate: session.candidate().map(String::from),
            hold_progress: session.progress(now),
            history_len: session.history_len(),
        }
    }

    pub async fn stats(&self) -> EngineStats {
        *self.stats.read().await
    }

    pub async fn transcript_text(&self) -> String {
        self.transcript.read().await.text()
    }

    pub async fn transcript_entries(&self) -> Vec<CommittedSymbol> {
        self.transcript.read().await.entries().to_vec()
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub async fn is_degraded(&self) -> bool {
        self.state.read().await.degraded
    }
}
