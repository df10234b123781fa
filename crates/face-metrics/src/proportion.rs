//! Facial proportions against ideal ratios

use crate::{landmark, MetricError};
use face_model::{LandmarkGroup, Point2D};

/// Score used for a ratio whose denominator collapsed to zero
const NEUTRAL_RATIO_SCORE: f64 = 0.5;

/// Golden ratio approximation
const GOLDEN_RATIO: f64 = 1.618;

/// Outer jaw corners
const JAW_SPAN: (usize, usize, Axis) = (
    LandmarkGroup::Jaw.first(),
    LandmarkGroup::Jaw.last(),
    Axis::Horizontal,
);

/// How a measured distance is taken between two landmarks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// One proportion: distance(numerator) / distance(denominator) vs an ideal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProportionRatio {
    pub name: &'static str,
    numerator: (usize, usize, Axis),
    denominator: (usize, usize, Axis),
    pub ideal: f64,
    pub weight: f64,
}

/// Eye span / face width, face height / face width, mouth width / nose width
pub const PROPORTION_RATIOS: [ProportionRatio; 3] = [
    ProportionRatio {
        name: "eye_span_to_face_width",
        numerator: (39, 42, Axis::Horizontal),
        denominator: JAW_SPAN,
        ideal: 0.46,
        weight: 0.3,
    },
    ProportionRatio {
        name: "face_height_to_width",
        numerator: (8, 27, Axis::Vertical),
        denominator: JAW_SPAN,
        ideal: GOLDEN_RATIO,
        weight: 0.4,
    },
    ProportionRatio {
        name: "mouth_to_nose_width",
        numerator: (48, 54, Axis::Horizontal),
        denominator: (31, 35, Axis::Horizontal),
        ideal: GOLDEN_RATIO,
        weight: 0.3,
    },
];

impl ProportionRatio {
    /// Closeness of the measured ratio to the ideal (1 = exact).
    ///
    /// Not clamped: a ratio more than twice the ideal goes negative.
    pub fn score(&self, points: &[Point2D]) -> Result<f64, MetricError> {
        let numerator = distance(points, self.numerator)?;
        let denominator = distance(points, self.denominator)?;

        if denominator == 0.0 {
            return Ok(NEUTRAL_RATIO_SCORE);
        }

        let ratio = numerator / denominator;
        Ok(1.0 - (ratio - self.ideal).abs() / self.ideal)
    }
}

fn distance(points: &[Point2D], (a, b, axis): (usize, usize, Axis)) -> Result<f64, MetricError> {
    let a = landmark(points, a)?;
    let b = landmark(points, b)?;
    Ok(match axis {
        Axis::Horizontal => (a.x - b.x).abs(),
        Axis::Vertical => (a.y - b.y).abs(),
    })
}

/// Weighted proportion score over `PROPORTION_RATIOS`
pub fn proportion_score(points: &[Point2D]) -> Result<f64, MetricError> {
    PROPORTION_RATIOS
        .iter()
        .try_fold(0.0, |acc, ratio| -> Result<f64, MetricError> {
            Ok(acc + ratio.score(points)? * ratio.weight)
        })
}
