pub mod config;
pub mod normalizer;
pub mod classifier;
pub mod consensus;
pub mod hold_commit;
pub mod watchdog;
pub mod stream_session;

// Orchestration
pub mod recognition_engine;
