//! Render sink contract

use face_model::DetectionResult;
use thiserror::Error;

/// Drawing failure reported by a render sink
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Render failed: {0}")]
pub struct RenderError(pub String);

/// Receives the latest stabilized detections once per tick
pub trait RenderSink: Send {
    fn render(&mut self, detections: &[DetectionResult]) -> Result<(), RenderError>;
}

impl<F> RenderSink for F
where
    F: FnMut(&[DetectionResult]) -> Result<(), RenderError> + Send,
{
    fn render(&mut self, detections: &[DetectionResult]) -> Result<(), RenderError> {
        self(detections)
    }
}

/// Sink for consumers that only read the published state
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl RenderSink for Headless {
    fn render(&mut self, _detections: &[DetectionResult]) -> Result<(), RenderError> {
        Ok(())
    }
}
