//! Consensus summary over detection history

use crate::{median, Tally};
use face_model::DetectionResult;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Representative values over the recent detection window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusSummary {
    /// Median age
    pub age: f64,
    /// Most frequent gender label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Most frequent emotion label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    /// Median composite score over scored entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beauty_score: Option<f64>,
    /// Number of snapshots summarized
    pub sample_count: usize,
}

/// Computes a `ConsensusSummary` from a window of snapshots
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    /// Summarize snapshots in temporal order.
    ///
    /// An empty window yields `None`, never a zero-filled summary.
    pub fn summarize<'a, I>(entries: I) -> Option<ConsensusSummary>
    where
        I: IntoIterator<Item = &'a DetectionResult>,
    {
        let mut ages = Vec::new();
        let mut scores = Vec::new();
        let mut genders = Tally::new();
        let mut emotions = Tally::new();

        for entry in entries {
            ages.push(entry.age);
            if let Some(score) = entry.beauty_score {
                scores.push(score);
            }
            if !entry.gender.label.is_empty() {
                genders.record(&entry.gender.label);
            }
            if !entry.emotion.label.is_empty() {
                emotions.record(&entry.emotion.label);
            }
        }

        let age = median(&ages)?;
        let summary = ConsensusSummary {
            age,
            gender: genders.mode().map(str::to_string),
            emotion: emotions.mode().map(str::to_string),
            beauty_score: median(&scores),
            sample_count: ages.len(),
        };

        debug!(
            samples = summary.sample_count,
            age = summary.age,
            "Consensus recomputed"
        );
        Some(summary)
    }
}
