//! Timeline assembly for the physio-timeline system.
//!
//! This crate handles:
//! - Shared time origin and relative timestamps
//! - Summary lines and marker label ranks for display
//! - The classify → normalize → align pipeline engine

pub mod aligner;
pub mod presentation;
pub mod pipeline;

pub use aligner::{align, shared_origin, AlignedTimestamps};
pub use presentation::{series_summary, LabelRanks};
pub use pipeline::{AlignedRecording, Pipeline};
