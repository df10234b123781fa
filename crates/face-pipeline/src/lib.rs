//! Face Stabilization Pipeline
//!
//! Owns the temporal state of one live session and runs each completed
//! detection through it:
//! - Scale raw detections into display space
//! - Smooth against the previous stabilized frame
//! - Score landmark geometry
//! - Sample into bounded history and recompute the consensus summary

pub mod config;
pub mod session;

pub use config::SessionConfig;
pub use session::{FaceSession, FrameOutcome};

use thiserror::Error;

/// Pipeline error types
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration loading failed: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
