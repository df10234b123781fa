//! Single-slot frame handoff between a capture thread and the detection loop

use crate::{FrameDimensions, FrameSource, VideoFrame};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Holds only the most recent frame; publishing replaces the previous one.
///
/// Clones share the same slot, so the capture side keeps one clone and the
/// scheduler gets another.
#[derive(Debug, Clone, Default)]
pub struct LatestFrame {
    slot: Arc<Mutex<Option<VideoFrame>>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held frame
    pub fn publish(&self, frame: VideoFrame) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(prev) = slot.as_ref() {
            debug!(
                "Frame {} replaced by {} before detection",
                prev.sequence, frame.sequence
            );
        }
        *slot = Some(frame);
    }

    /// Drop the held frame (source went away)
    pub fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl FrameSource for LatestFrame {
    fn is_ready(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn dimensions(&self) -> FrameDimensions {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(VideoFrame::dimensions)
            .unwrap_or_default()
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
