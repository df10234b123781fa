//! Facial Metric Scoring
//!
//! Heuristic scores derived from 68-point landmark geometry:
//! - Symmetry of 23 left/right landmark pairs around the nose bridge
//! - Three facial proportions against their ideal ratios
//! - A composite 1-10 score combining both
//!
//! Scoring never aborts the pipeline; bad input falls back to a neutral score.

mod proportion;
mod symmetry;

pub use proportion::{proportion_score, ProportionRatio, PROPORTION_RATIOS};
pub use symmetry::{symmetry_score, SYMMETRY_PAIRS};

use face_model::{Point2D, LANDMARK_COUNT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Score reported when landmarks cannot be scored
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Lowest composite score
pub const MIN_SCORE: f64 = 1.0;

/// Highest composite score
pub const MAX_SCORE: f64 = 10.0;

/// Weight of symmetry in the composite score
pub const SYMMETRY_WEIGHT: f64 = 0.6;

/// Weight of proportions in the composite score
pub const PROPORTION_WEIGHT: f64 = 0.4;

/// Scoring error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("Need 68 landmarks, got {0}")]
    InsufficientLandmarks(usize),

    #[error("Landmark {0} missing")]
    MissingLandmark(usize),

    #[error("Score is not a finite number")]
    NonFinite,
}

/// Bounds-checked landmark lookup
pub(crate) fn landmark(points: &[Point2D], index: usize) -> Result<Point2D, MetricError> {
    points
        .get(index)
        .copied()
        .ok_or(MetricError::MissingLandmark(index))
}

/// Symmetry, proportion and composite score for one face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacialMetrics {
    /// Symmetry (0-1)
    pub symmetry: f64,
    /// Weighted proportion score (nominally 0-1)
    pub proportion: f64,
    /// Composite score, integer in 1-10
    pub score: f64,
}

impl FacialMetrics {
    /// Score a landmark list
    pub fn analyze(points: &[Point2D]) -> Result<Self, MetricError> {
        if points.len() < LANDMARK_COUNT {
            return Err(MetricError::InsufficientLandmarks(points.len()));
        }

        let symmetry = symmetry_score(points)?;
        let proportion = proportion_score(points)?;
        let score = composite_score(symmetry, proportion)?;

        Ok(Self {
            symmetry,
            proportion,
            score,
        })
    }
}

/// Combine symmetry and proportion into an integer score clamped to 1-10
pub fn composite_score(symmetry: f64, proportion: f64) -> Result<f64, MetricError> {
    let raw = ((symmetry * SYMMETRY_WEIGHT + proportion * PROPORTION_WEIGHT) * 10.0).round();
    if !raw.is_finite() {
        return Err(MetricError::NonFinite);
    }
    Ok(raw.clamp(MIN_SCORE, MAX_SCORE))
}

/// Composite score for a landmark list, or `NEUTRAL_SCORE` when it cannot be
/// computed
pub fn beauty_score(points: &[Point2D]) -> f64 {
    match FacialMetrics::analyze(points) {
        Ok(metrics) => metrics.score,
        Err(e) => {
            warn!("Facial scoring fell back to neutral: {}", e);
            NEUTRAL_SCORE
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub const MIDLINE: f64 = 100.0;
    pub const FACE_WIDTH: f64 = 120.0;
    pub const NOSE_WIDTH: f64 = 30.0;

    /// Perfectly symmetric face whose proportions hit every ideal ratio
    pub fn ideal_face() -> Vec<Point2D> {
        let mut points = vec![Point2D::new(MIDLINE, 100.0); LANDMARK_COUNT];

        let mut mirror = |left: usize, right: usize, half: f64| {
            points[left] = Point2D::new(MIDLINE - half, 100.0);
            points[right] = Point2D::new(MIDLINE + half, 100.0);
        };
        mirror(0, 16, FACE_WIDTH / 2.0);
        mirror(39, 42, FACE_WIDTH * 0.46 / 2.0);
        mirror(48, 54, NOSE_WIDTH * 1.618 / 2.0);

        points[31] = Point2D::new(MIDLINE - NOSE_WIDTH / 2.0, 120.0);
        points[35] = Point2D::new(MIDLINE + NOSE_WIDTH / 2.0, 120.0);
        points[27] = Point2D::new(MIDLINE, 50.0);
        points[8] = Point2D::new(MIDLINE, 50.0 + FACE_WIDTH * 1.618);
        points
    }
}
