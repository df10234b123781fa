//! Detection History Buffer
//!
//! Fixed-capacity FIFO of past stabilized detections, fed at a decimated
//! rate. Only the first (dominant) subject of each sampled frame is kept.

mod buffer;

pub use buffer::HistoryBuffer;

/// Default number of snapshots retained
pub const DEFAULT_CAPACITY: usize = 30;

/// Default decimation: sample every 5th processed frame
pub const DEFAULT_SAMPLE_INTERVAL: u64 = 5;
