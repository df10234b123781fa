//! Facial Detection Data Model
//!
//! Types shared by every stage of the stabilization pipeline:
//! - Points and bounding boxes in video pixel space
//! - Fixed 68-point landmark sets with semantic index groups
//! - Raw detector output and the per-frame `DetectionResult`

mod detection;
mod geometry;
mod landmarks;

pub use detection::{Classification, DetectionResult, RawDetection};
pub use geometry::{BoundingBox, Point2D};
pub use landmarks::{LandmarkGroup, LandmarkSet, LANDMARK_COUNT};

use thiserror::Error;

/// Data model error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Landmark set must contain {expected} points, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    #[error("Detection carries no expression probabilities")]
    NoExpressions,
}
