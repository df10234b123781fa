//! Logging setup and metrics

use crate::SchedulerError;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Initialize logging.
///
/// Fails instead of panicking when a global subscriber is already set.
pub fn init_logging(level: Level, format: LogFormat) -> Result<(), SchedulerError> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    };
    result.map_err(|e| SchedulerError::Logging(e.to_string()))
}

/// Metric names as constants for consistency.
pub mod names {
    pub const DETECTIONS_STARTED: &str = "face_detections_started_total";
    pub const DETECTIONS_COMPLETED: &str = "face_detections_completed_total";
    pub const DETECTIONS_FAILED: &str = "face_detections_failed_total";
    pub const DETECTIONS_DISCARDED: &str = "face_detections_discarded_total";
    pub const DETECTION_DURATION_SECONDS: &str = "face_detection_duration_seconds";
    pub const HISTORY_LENGTH: &str = "face_history_length";
    pub const RENDER_FAILURES: &str = "face_render_failures_total";
}

pub(crate) fn record_detection_started() {
    metrics::counter!(names::DETECTIONS_STARTED).increment(1);
}

pub(crate) fn record_detection_completed(duration_secs: f64, subjects: usize) {
    metrics::counter!(names::DETECTIONS_COMPLETED, "subjects" => subjects.min(4).to_string())
        .increment(1);
    metrics::histogram!(names::DETECTION_DURATION_SECONDS).record(duration_secs);
}

pub(crate) fn record_detection_failed() {
    metrics::counter!(names::DETECTIONS_FAILED).increment(1);
}

pub(crate) fn record_detection_discarded() {
    metrics::counter!(names::DETECTIONS_DISCARDED).increment(1);
}

pub(crate) fn set_history_length(len: usize) {
    metrics::gauge!(names::HISTORY_LENGTH).set(len as f64);
}

pub(crate) fn record_render_failure() {
    metrics::counter!(names::RENDER_FAILURES).increment(1);
}
