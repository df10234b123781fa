//! Bounded FIFO history implementation

use crate::{DEFAULT_CAPACITY, DEFAULT_SAMPLE_INTERVAL};
use face_model::DetectionResult;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// FIFO history of detection snapshots, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryBuffer {
    /// Stored snapshots in temporal order
    entries: VecDeque<DetectionResult>,
    /// Maximum number of snapshots
    capacity: usize,
    /// Sample every N-th processed frame
    sample_interval: u64,
    /// Processed frames seen since creation or last clear
    frame_counter: u64,
    /// Total snapshots appended (for statistics)
    total_pushed: u64,
}

impl HistoryBuffer {
    /// Create a buffer; zero capacity or interval is bumped to 1
    pub fn new(capacity: usize, sample_interval: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            sample_interval: sample_interval.max(1),
            frame_counter: 0,
            total_pushed: 0,
        }
    }

    /// Create a buffer with default capacity (30) and interval (5)
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_SAMPLE_INTERVAL)
    }

    /// Offer one processed frame's detections.
    ///
    /// The counter is checked before it is incremented, so frames 0, K, 2K...
    /// are sampled. Empty frames still advance the counter but never add a
    /// placeholder. Returns `true` when the buffer changed.
    pub fn offer_frame(&mut self, detections: &[DetectionResult]) -> bool {
        let sampled = self.frame_counter % self.sample_interval == 0;
        self.frame_counter += 1;

        if !sampled {
            return false;
        }

        match detections.first() {
            Some(primary) => {
                self.push(primary.clone());
                true
            }
            None => {
                trace!("Sampled frame had no subjects, history unchanged");
                false
            }
        }
    }

    /// Append a snapshot directly (evicts the oldest when full)
    pub fn push(&mut self, entry: DetectionResult) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.total_pushed += 1;
    }

    /// Read-only ordered view, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &DetectionResult> {
        self.entries.iter()
    }

    /// Most recent snapshot
    pub fn latest(&self) -> Option<&DetectionResult> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sample_interval(&self) -> u64 {
        self.sample_interval
    }

    /// Processed frames seen since creation or last clear
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Total snapshots appended since creation
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }

    /// Empty the buffer and restart the frame counter at 0
    pub fn clear(&mut self) {
        debug!(
            "Clearing history ({} entries, {} frames seen)",
            self.entries.len(),
            self.frame_counter
        );
        self.entries.clear();
        self.frame_counter = 0;
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::with_defaults()
    }
}
