//! Per-detection smoothing

use crate::{blend, DEFAULT_SMOOTHING_FACTOR};
use face_model::{BoundingBox, Classification, DetectionResult, Point2D};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Exponential smoother for detections.
///
/// Every continuous field (age, box, landmark points) uses the same factor.
/// Labels always come from the newest detection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Smoother {
    /// Weight of the previous value (0-1, higher = smoother)
    factor: f64,
    /// Also blend gender/emotion confidences
    smooth_confidence: bool,
}

impl Smoother {
    /// Create a smoother; the factor is clamped to [0, 1]
    pub fn new(factor: f64) -> Self {
        Self {
            factor: factor.clamp(0.0, 1.0),
            smooth_confidence: false,
        }
    }

    pub fn with_confidence_smoothing(mut self, enabled: bool) -> Self {
        self.smooth_confidence = enabled;
        self
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Smooth one detection against its predecessor.
    ///
    /// Returns a new value; `previous` is never touched.
    pub fn smooth(
        &self,
        previous: Option<&DetectionResult>,
        current: DetectionResult,
    ) -> DetectionResult {
        let Some(prev) = previous else {
            return current;
        };

        let landmarks = match (&prev.landmarks, &current.landmarks) {
            (Some(old), Some(new)) => Some(new.map_points(|i, p| {
                let before = old.points().get(i);
                Point2D::new(
                    blend(before.map(|b| b.x), p.x, self.factor),
                    blend(before.map(|b| b.y), p.y, self.factor),
                )
            })),
            _ => current.landmarks.clone(),
        };

        DetectionResult {
            bbox: self.smooth_box(&prev.bbox, &current.bbox),
            age: blend(Some(prev.age), current.age, self.factor),
            gender: self.smooth_label(&prev.gender, current.gender),
            emotion: self.smooth_label(&prev.emotion, current.emotion),
            landmarks,
            beauty_score: current.beauty_score,
        }
    }

    /// Smooth a whole frame by list position.
    ///
    /// The i-th new detection is paired with the i-th previous one. With more
    /// than one subject, reordering or a subject leaving mid-list pairs the
    /// wrong faces; no identity matching is attempted.
    pub fn smooth_frame(
        &self,
        previous: &[DetectionResult],
        current: Vec<DetectionResult>,
    ) -> Vec<DetectionResult> {
        if previous.len() != current.len() && !previous.is_empty() {
            debug!(
                "Subject count changed {} -> {}, pairing by index",
                previous.len(),
                current.len()
            );
        }

        current
            .into_iter()
            .enumerate()
            .map(|(i, detection)| self.smooth(previous.get(i), detection))
            .collect()
    }

    fn smooth_box(&self, prev: &BoundingBox, current: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x: blend(Some(prev.x), current.x, self.factor),
            y: blend(Some(prev.y), current.y, self.factor),
            width: blend(Some(prev.width), current.width, self.factor),
            height: blend(Some(prev.height), current.height, self.factor),
        }
    }

    /// Confidence only carries over while the label stays the same
    fn smooth_label(&self, prev: &Classification, current: Classification) -> Classification {
        if !self.smooth_confidence || prev.label != current.label {
            return current;
        }
        Classification {
            confidence: blend(Some(prev.confidence), current.confidence, self.factor),
            label: current.label,
        }
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_FACTOR)
    }
}
