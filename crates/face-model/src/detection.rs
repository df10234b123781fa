//! Raw and processed detections

use crate::{BoundingBox, LandmarkSet, ModelError, Point2D};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// A categorical label with its confidence (0-1)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f64,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// Confidence as a rounded percentage
    pub fn percent(&self) -> u32 {
        (self.confidence * 100.0).round().clamp(0.0, 100.0) as u32
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}%)", self.label, self.percent())
    }
}

/// One subject's detector output for a single frame, before any processing.
///
/// Landmarks are unchecked here; the detector may hand back partial lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub bbox: BoundingBox,
    pub age: f64,
    pub gender: Classification,
    /// Expression name -> probability, in detector order
    pub expressions: Vec<(String, f64)>,
    pub landmarks: Vec<Point2D>,
}

impl RawDetection {
    /// Expression with the highest probability (later entries win ties)
    pub fn dominant_expression(&self) -> Result<Classification, ModelError> {
        self.expressions
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(name, p)| Classification::new(name.clone(), *p))
            .ok_or(ModelError::NoExpressions)
    }

    /// Scale box and landmarks from source to display resolution
    pub fn scaled(mut self, sx: f64, sy: f64) -> Self {
        self.bbox = self.bbox.scaled(sx, sy);
        for point in &mut self.landmarks {
            *point = point.scaled(sx, sy);
        }
        self
    }

    /// Convert into a `DetectionResult`.
    ///
    /// Landmark lists that are not exactly 68 points are dropped entirely.
    /// A detection without expressions gets an empty emotion label.
    pub fn into_result(self) -> DetectionResult {
        let emotion = self.dominant_expression().unwrap_or_default();
        let landmarks = match LandmarkSet::try_from(self.landmarks) {
            Ok(set) => Some(set),
            Err(e) => {
                warn!("Dropping malformed landmarks: {}", e);
                None
            }
        };

        DetectionResult {
            bbox: self.bbox,
            age: self.age,
            gender: self.gender,
            emotion,
            landmarks,
            beauty_score: None,
        }
    }
}

/// Processed per-frame detection of one subject
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub bbox: BoundingBox,
    pub age: f64,
    pub gender: Classification,
    pub emotion: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<LandmarkSet>,
    /// Composite facial metric score (1-10), absent until scored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beauty_score: Option<f64>,
}

impl DetectionResult {
    /// Copy of this detection carrying a score
    pub fn with_beauty_score(self, score: f64) -> Self {
        Self {
            beauty_score: Some(score),
            ..self
        }
    }

    pub fn has_landmarks(&self) -> bool {
        self.landmarks.is_some()
    }
}
