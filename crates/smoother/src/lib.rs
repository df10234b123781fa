//! Detection Smoothing
//!
//! Blends each new detection against the previous stabilized one so boxes,
//! ages and landmark points do not flicker between frames.

mod detection;

pub use detection::Smoother;

/// Default weight given to the previous stabilized value
pub const DEFAULT_SMOOTHING_FACTOR: f64 = 0.5;

/// Exponential blend of a single value.
///
/// `previous * factor + current * (1 - factor)`, or `current` when there is
/// no previous value.
pub fn blend(previous: Option<f64>, current: f64, factor: f64) -> f64 {
    match previous {
        Some(prev) => prev * factor + current * (1.0 - factor),
        None => current,
    }
}
