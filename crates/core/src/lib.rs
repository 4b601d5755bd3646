//! Core types and configuration for the physio-timeline system.
//!
//! This crate provides shared types used across all other crates:
//! - Stream records, samples and role assignments
//! - Marker events (raw and normalized) and aligned series
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
