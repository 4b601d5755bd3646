//! Shared time origin for all classified streams.
//!
//! The origin is the earliest first timestamp among the non-empty
//! sequences (0 when every sequence is empty). Each non-empty sequence is
//! shifted by it; empty sequences stay empty.

use physio_core::Seconds;
use serde::{Deserialize, Serialize};

/// Timestamps of the three roles re-expressed relative to one origin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedTimestamps {
    /// Absolute time mapped to zero.
    pub origin: Seconds,
    pub signal_a: Vec<Seconds>,
    pub signal_b: Vec<Seconds>,
    pub marker: Vec<Seconds>,
}

/// Earliest first timestamp over the non-empty sequences, or 0.
pub fn shared_origin(sequences: &[&[Seconds]]) -> Seconds {
    sequences
        .iter()
        .filter_map(|seq| seq.first().copied())
        .reduce(f64::min)
        .unwrap_or(0.0)
}

/// Subtract `origin` from every timestamp.
pub fn shift(timestamps: &[Seconds], origin: Seconds) -> Vec<Seconds> {
    timestamps.iter().map(|t| t - origin).collect()
}

/// Align the signal A, signal B and marker timestamps.
pub fn align(signal_a: &[Seconds], signal_b: &[Seconds], marker: &[Seconds]) -> AlignedTimestamps {
    let origin = shared_origin(&[signal_a, signal_b, marker]);
    AlignedTimestamps {
        origin,
        signal_a: shift(signal_a, origin),
        signal_b: shift(signal_b, origin),
        marker: shift(marker, origin),
    }
}
