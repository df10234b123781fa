//! Consumer-side handle to a running scheduler

use crate::SchedulerError;
use consensus::ConsensusSummary;
use face_model::DetectionResult;
use std::sync::Arc;
use tokio::sync::watch;

/// Latest requests from the UI to the loop task.
///
/// Held in a `watch` slot, so any number of requests coalesce into one value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Control {
    /// Bumped on every reset request
    pub(crate) reset_generation: u64,
    pub(crate) shutdown: bool,
}

/// Stabilized detections as published after each applied result
pub type StabilizedState = Arc<Vec<DetectionResult>>;

/// Handle for resetting, stopping and observing a scheduler.
///
/// Clones share the same session. When the last clone is dropped the
/// scheduler shuts down.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    control: Arc<watch::Sender<Control>>,
    stabilized: watch::Receiver<StabilizedState>,
    consensus: watch::Receiver<Option<ConsensusSummary>>,
}

impl SessionHandle {
    pub(crate) fn new(
        control: watch::Sender<Control>,
        stabilized: watch::Receiver<StabilizedState>,
        consensus: watch::Receiver<Option<ConsensusSummary>>,
    ) -> Self {
        Self {
            control: Arc::new(control),
            stabilized,
            consensus,
        }
    }

    /// Clear history, consensus and the frame counter. Idempotent.
    pub fn reset(&self) -> Result<(), SchedulerError> {
        if self.control.is_closed() {
            return Err(SchedulerError::Stopped);
        }
        self.control.send_modify(|control| {
            control.reset_generation = control.reset_generation.wrapping_add(1);
        });
        Ok(())
    }

    /// Stop ticking and discard any detection still in flight.
    ///
    /// Calling this on a stopped scheduler does nothing.
    pub fn shutdown(&self) {
        self.control.send_modify(|control| control.shutdown = true);
    }

    /// Whether the loop task is still running
    pub fn is_running(&self) -> bool {
        !self.control.is_closed()
    }

    /// Latest stabilized detections
    pub fn stabilized(&self) -> StabilizedState {
        Arc::clone(&self.stabilized.borrow())
    }

    /// Latest consensus summary
    pub fn consensus(&self) -> Option<ConsensusSummary> {
        self.consensus.borrow().clone()
    }

    /// Receiver notified each time a detection result is applied
    pub fn subscribe_stabilized(&self) -> watch::Receiver<StabilizedState> {
        self.stabilized.clone()
    }

    /// Receiver notified each time the consensus is recomputed or cleared
    pub fn subscribe_consensus(&self) -> watch::Receiver<Option<ConsensusSummary>> {
        self.consensus.clone()
    }
}
