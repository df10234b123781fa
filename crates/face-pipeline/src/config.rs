//! Session configuration

use crate::PipelineError;
use ::config::{Config, Environment, File, FileFormat};
use frame_source::FrameDimensions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Prefix of environment variable overrides (`FACE_CONSENSUS_SMOOTHING_FACTOR`, ...)
pub const ENV_PREFIX: &str = "FACE_CONSENSUS";

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minimum time between detection starts (milliseconds)
    pub detection_interval_ms: u64,

    /// Render tick period (milliseconds)
    pub tick_interval_ms: u64,

    /// Weight of the previous stabilized value (0-1)
    pub smoothing_factor: f64,

    /// Also smooth gender/emotion confidences
    pub smooth_confidence: bool,

    /// Snapshots kept for the consensus summary
    pub history_capacity: usize,

    /// Sample every N-th processed frame into history
    pub history_sample_interval: u64,

    /// Display surface; detections are rescaled from source to this size
    pub display: Option<FrameDimensions>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            detection_interval_ms: 100,
            tick_interval_ms: 16,
            smoothing_factor: smoother::DEFAULT_SMOOTHING_FACTOR,
            smooth_confidence: false,
            history_capacity: history_buffer::DEFAULT_CAPACITY,
            history_sample_interval: history_buffer::DEFAULT_SAMPLE_INTERVAL,
            display: None,
        }
    }
}

impl SessionConfig {
    /// Load defaults, overlaid by an optional file and then by
    /// `FACE_CONSENSUS_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!("Loading session config from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from an in-memory document (no environment overrides)
    pub fn from_document(text: &str, format: FileFormat) -> Result<Self, PipelineError> {
        let config: Self = Config::builder()
            .add_source(File::from_str(text, format))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the session cannot run with
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..=1.0).contains(&self.smoothing_factor) {
            return Err(PipelineError::InvalidConfig(format!(
                "smoothing_factor {} outside [0, 1]",
                self.smoothing_factor
            )));
        }
        if self.history_capacity == 0 {
            return Err(PipelineError::InvalidConfig(
                "history_capacity must be at least 1".into(),
            ));
        }
        if self.history_sample_interval == 0 {
            return Err(PipelineError::InvalidConfig(
                "history_sample_interval must be at least 1".into(),
            ));
        }
        if self.detection_interval_ms == 0 || self.tick_interval_ms == 0 {
            return Err(PipelineError::InvalidConfig(
                "detection and tick intervals must be non-zero".into(),
            ));
        }
        if self.display.is_some_and(|d| d.is_empty()) {
            return Err(PipelineError::InvalidConfig(
                "display dimensions must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
