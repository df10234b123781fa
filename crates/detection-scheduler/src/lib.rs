//! Detection Scheduler
//!
//! Drives a live face session:
//! - Ticks at the render rate and draws the latest stabilized state every tick
//! - Starts at most one detector call at a time, no more often than the
//!   configured detection interval
//! - Applies each completed detection atomically on the loop task
//! - Publishes stabilized detections and the consensus summary to UI consumers

pub mod gateway;
pub mod handle;
pub mod render;
pub mod scheduler;
pub mod telemetry;

pub use gateway::{DetectorError, DetectorGateway};
pub use handle::SessionHandle;
pub use render::{Headless, RenderError, RenderSink};
pub use scheduler::DetectionScheduler;
pub use telemetry::{init_logging, LogFormat};

use face_pipeline::PipelineError;
use thiserror::Error;

/// Scheduler error types
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Session has stopped")]
    Stopped,

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
