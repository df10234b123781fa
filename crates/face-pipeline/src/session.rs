//! Per-frame stabilization session

use crate::{PipelineError, SessionConfig};
use consensus::{Aggregator, ConsensusSummary};
use face_metrics::{beauty_score, NEUTRAL_SCORE};
use face_model::{DetectionResult, RawDetection};
use frame_source::FrameDimensions;
use history_buffer::HistoryBuffer;
use smoother::Smoother;
use tracing::{debug, info};

/// What one processed frame changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Subjects in the new stabilized state
    pub subjects: usize,
    /// Whether the history buffer (and therefore the consensus) changed
    pub history_changed: bool,
}

/// Temporal state of one live session.
///
/// Each session owns its own state, so several can run side by side.
#[derive(Debug, Clone)]
pub struct FaceSession {
    config: SessionConfig,
    smoother: Smoother,
    /// Latest smoothed detections, replaced wholesale every frame
    stabilized: Vec<DetectionResult>,
    history: HistoryBuffer,
    consensus: Option<ConsensusSummary>,
}

impl FaceSession {
    /// Create a session from a validated configuration
    pub fn new(config: SessionConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        info!(
            "Creating face session: smoothing={}, history={}x every {} frames",
            config.smoothing_factor, config.history_capacity, config.history_sample_interval
        );

        Ok(Self {
            smoother: Smoother::new(config.smoothing_factor)
                .with_confidence_smoothing(config.smooth_confidence),
            stabilized: Vec::new(),
            history: HistoryBuffer::new(config.history_capacity, config.history_sample_interval),
            consensus: None,
            config,
        })
    }

    /// Run one completed detection through the pipeline.
    ///
    /// `source` is the frame size the detector saw; detections are rescaled to
    /// the configured display size before smoothing.
    pub fn process(&mut self, raw: Vec<RawDetection>, source: FrameDimensions) -> FrameOutcome {
        let (sx, sy) = match self.config.display {
            Some(display) => source.scale_to(display),
            None => (1.0, 1.0),
        };

        let current: Vec<DetectionResult> = raw
            .into_iter()
            .map(|detection| detection.scaled(sx, sy).into_result())
            .collect();

        let stabilized: Vec<DetectionResult> = self
            .smoother
            .smooth_frame(&self.stabilized, current)
            .into_iter()
            .map(score_detection)
            .collect();

        self.stabilized = stabilized;
        let history_changed = self.history.offer_frame(&self.stabilized);
        if history_changed {
            self.consensus = Aggregator::summarize(self.history.iter());
        }

        debug!(
            subjects = self.stabilized.len(),
            history = self.history.len(),
            history_changed,
            "Frame processed"
        );

        FrameOutcome {
            subjects: self.stabilized.len(),
            history_changed,
        }
    }

    /// Latest stabilized detections
    pub fn stabilized(&self) -> &[DetectionResult] {
        &self.stabilized
    }

    /// Latest consensus summary (`None` while history is empty)
    pub fn consensus(&self) -> Option<&ConsensusSummary> {
        self.consensus.as_ref()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Processed frames since start or last reset
    pub fn frame_counter(&self) -> u64 {
        self.history.frame_counter()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Clear history, consensus and the frame counter.
    ///
    /// The stabilized state is kept so the overlay does not blink.
    pub fn reset(&mut self) {
        info!("Resetting session statistics");
        self.history.clear();
        self.consensus = None;
    }
}

/// Attach the composite score; detections without landmarks score neutral
fn score_detection(detection: DetectionResult) -> DetectionResult {
    let score = detection
        .landmarks
        .as_ref()
        .map(|set| beauty_score(set.points()))
        .unwrap_or(NEUTRAL_SCORE);
    detection.with_beauty_score(score)
}
