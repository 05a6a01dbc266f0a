use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning knobs for the recognition pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StabilizerConfig {
    /// Maximum predictions kept per consensus window
    pub history_window: usize,
    /// Predictions older than this are evicted from the window (milliseconds)
    pub history_horizon_ms: u64,
    /// Fraction of the window the leading symbol must hold (0.0-1.0)
    pub agreement_threshold: f32,
    /// Minimum mean confidence for a consensus to count (0.0-1.0)
    pub min_confidence: f32,
    /// How long a symbol must hold consensus before it commits (milliseconds)
    pub hold_delay_ms: u64,
    /// Refractory period after a commit (milliseconds)
    pub cooldown_ms: u64,
    /// Zero-hand duration that triggers a pipeline reset (milliseconds)
    pub absence_reset_ms: u64,
    /// Minimum spacing between classification requests (milliseconds)
    pub throttle_interval_ms: u64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            history_window: 5,
            history_horizon_ms: 2000,
            agreement_threshold: 0.6,
            min_confidence: 0.6,
            hold_delay_ms: 1500,
            cooldown_ms: 1000,
            absence_reset_ms: 500,
            throttle_interval_ms: 300,
        }
    }
}

impl StabilizerConfig {
    /// Load configuration from file, creating with defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: StabilizerConfig = serde_json::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            // Create default config and save it
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.validate()?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Serialize and write to file with pretty formatting
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        // Validate window size
        if self.history_window == 0 || self.history_window > 100 {
            return Err(format!(
                "Invalid history window: {}. Must be between 1 and 100",
                self.history_window
            )
            .into());
        }

        // Validate history horizon
        if self.history_horizon_ms == 0 {
            return Err(format!(
                "Invalid history horizon: {} ms. Must be greater than 0",
                self.history_horizon_ms
            )
            .into());
        }

        // Validate agreement threshold
        if !(0.0..=1.0).contains(&self.agreement_threshold) {
            return Err(format!(
                "Invalid agreement threshold: {}. Must be between 0.0 and 1.0",
                self.agreement_threshold
            )
            .into());
        }

        // Validate confidence floor
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(format!(
                "Invalid confidence floor: {}. Must be between 0.0 and 1.0",
                self.min_confidence
            )
            .into());
        }

        // Validate hold delay
        if self.hold_delay_ms == 0 {
            return Err(format!(
                "Invalid hold delay: {} ms. Must be greater than 0",
                self.hold_delay_ms
            )
            .into());
        }

        // Validate cooldown
        if self.cooldown_ms == 0 {
            return Err(format!(
                "Invalid cooldown: {} ms. Must be greater than 0",
                self.cooldown_ms
            )
            .into());
        }

        // Validate absence reset window
        if self.absence_reset_ms == 0 {
            return Err(format!(
                "Invalid absence reset window: {} ms. Must be greater than 0",
                self.absence_reset_ms
            )
            .into());
        }

        // Validate throttle interval
        if self.throttle_interval_ms == 0 {
            return Err(format!(
                "Invalid throttle interval: {} ms. Must be greater than 0",
                self.throttle_interval_ms
            )
            .into());
        }

        Ok(())
    }
}
