//! Left/right symmetry around the nose bridge

use crate::{landmark, MetricError};
use face_model::{LandmarkGroup, Point2D};

/// Landmark whose x coordinate is the facial midline (top of the nose bridge)
pub const MIDLINE_LANDMARK: usize = LandmarkGroup::NoseBridge.first();

/// Left/right landmark pairs compared for symmetry
pub const SYMMETRY_PAIRS: [(usize, usize); 23] = [
    // Jaw line
    (0, 16),
    (1, 15),
    (2, 14),
    (3, 13),
    (4, 12),
    (5, 11),
    (6, 10),
    // Eyebrows
    (17, 26),
    (18, 25),
    (19, 24),
    (20, 23),
    (21, 22),
    // Eyes
    (36, 45),
    (37, 44),
    (38, 43),
    (39, 42),
    (40, 47),
    (41, 46),
    // Lips
    (48, 54),
    (49, 53),
    (50, 52),
    (59, 55),
    (58, 56),
];

/// Vertical offset (pixels) at which a pair's vertical term reaches zero
const VERTICAL_TOLERANCE: f64 = 20.0;

const HORIZONTAL_WEIGHT: f64 = 0.7;
const VERTICAL_WEIGHT: f64 = 0.3;

/// Average symmetry over all pairs (0-1, 1 = perfectly symmetric)
pub fn symmetry_score(points: &[Point2D]) -> Result<f64, MetricError> {
    let midline = landmark(points, MIDLINE_LANDMARK)?.x;

    let mut total = 0.0;
    for &(left_idx, right_idx) in &SYMMETRY_PAIRS {
        let left = landmark(points, left_idx)?;
        let right = landmark(points, right_idx)?;
        total += pair_symmetry(midline, left, right);
    }

    Ok(total / SYMMETRY_PAIRS.len() as f64)
}

fn pair_symmetry(midline: f64, left: Point2D, right: Point2D) -> f64 {
    let left_dist = (midline - left.x).abs();
    let right_dist = (right.x - midline).abs();

    // Both points on the midline: nothing to compare, count as symmetric
    let max_dist = left_dist.max(right_dist);
    let horizontal = if max_dist == 0.0 {
        1.0
    } else {
        1.0 - (left_dist - right_dist).abs() / max_dist
    };

    let vertical = (1.0 - (left.y - right.y).abs() / VERTICAL_TOLERANCE).clamp(0.0, 1.0);

    horizontal * HORIZONTAL_WEIGHT + vertical * VERTICAL_WEIGHT
}
