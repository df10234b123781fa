//! Detector gateway contract

use async_trait::async_trait;
use face_model::RawDetection;
use frame_source::VideoFrame;
use thiserror::Error;

/// Detector failures. None of them stop the loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("Detector not available: {0}")]
    Unavailable(String),

    #[error("Detection failed: {0}")]
    Failed(String),

    #[error("Detector task panicked: {0}")]
    Panicked(String),
}

/// Black-box face detector.
///
/// Given a frame, asynchronously returns zero or more raw detections.
#[async_trait]
pub trait DetectorGateway: Send + Sync {
    async fn detect(&self, frame: &VideoFrame) -> Result<Vec<RawDetection>, DetectorError>;
}
