//! Stream ingestion and normalization for the physio-timeline system.
//!
//! This crate handles:
//! - Metadata text extraction from loosely structured stream headers
//! - Stream role classification (marker / signal A / signal B)
//! - Marker coercion, sentinel filtering, code mapping and run collapsing

pub mod metadata;
pub mod classifier;
pub mod markers;

pub use classifier::{Classification, RuleKind, StreamClassifier};
pub use markers::{MarkerNormalizer, NormalizationStats};
pub use metadata::StreamDescriptor;
