//! Video Frame Source
//!
//! The capture side of the pipeline is an external collaborator. This crate
//! defines what the detection loop needs from it:
//! - a readiness signal (a decodable frame is available)
//! - the current pixel dimensions
//! - the latest decoded frame

pub mod frame;
pub mod latest;

pub use frame::{FrameDimensions, VideoFrame};
pub use latest::LatestFrame;

use thiserror::Error;

/// Frame error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Buffer of {actual} bytes does not match {width}x{height} RGB ({expected} bytes)")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Frame has zero-sized dimensions")]
    EmptyFrame,
}

/// Anything that can hand the detection loop its current frame
pub trait FrameSource: Send + Sync {
    /// Whether a decodable frame is currently available
    fn is_ready(&self) -> bool;

    /// Current pixel dimensions of the source
    fn dimensions(&self) -> FrameDimensions;

    /// Latest decoded frame, if any
    fn current_frame(&self) -> Option<VideoFrame>;
}
