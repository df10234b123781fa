//! Consensus Aggregation
//!
//! Reduces a window of detection snapshots to one representative summary:
//! numeric fields by median, categorical fields by mode.

mod statistics;
mod summary;

pub use statistics::{median, Tally};
pub use summary::{Aggregator, ConsensusSummary};
