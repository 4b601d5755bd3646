//! Configuration structures for the physio-timeline system.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stream classifier configuration.
    pub classifier: ClassifierConfig,
    /// Marker normalizer configuration.
    pub normalizer: NormalizerConfig,
}

impl Config {
    /// Parse a configuration from JSON; missing sections take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check the configuration for inconsistencies.
    pub fn validate(&self) -> Result<()> {
        self.classifier.validate()?;
        self.normalizer.validate()
    }
}

/// Keyword set for one continuous signal role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRoleConfig {
    /// Display name used in summaries (e.g., "ECG").
    pub name: String,
    /// Metadata keywords, matched case-insensitively as substrings.
    pub keywords: Vec<String>,
}

impl SignalRoleConfig {
    /// Create a role config.
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Legacy fixed stream positions, used only as a last resort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyPositions {
    /// Whether the positional defaults may fire at all.
    pub enabled: bool,
    /// Marker stream index.
    pub marker: usize,
    /// Signal A stream index.
    pub signal_a: usize,
    /// Signal B stream index.
    pub signal_b: usize,
}

impl Default for LegacyPositions {
    fn default() -> Self {
        Self {
            enabled: true,
            marker: 1,
            signal_a: 0,
            signal_b: 2,
        }
    }
}

/// Stream classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Keywords identifying a marker/event stream.
    pub marker_keywords: Vec<String>,
    /// First continuous signal role.
    pub signal_a: SignalRoleConfig,
    /// Second continuous signal role.
    pub signal_b: SignalRoleConfig,
    /// Legacy positional defaults.
    pub legacy_positions: LegacyPositions,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            marker_keywords: vec!["marker".to_string(), "event".to_string()],
            signal_a: SignalRoleConfig::new("ECG", &["ecg", "ekg"]),
            signal_b: SignalRoleConfig::new("GSR", &["gsr", "galvanic", "eda", "electrodermal"]),
            legacy_positions: LegacyPositions::default(),
        }
    }
}

impl ClassifierConfig {
    fn validate(&self) -> Result<()> {
        if self.marker_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(Error::config("marker_keywords must contain a non-empty keyword"));
        }
        for role in [&self.signal_a, &self.signal_b] {
            if role.name.trim().is_empty() {
                return Err(Error::config("signal role name must not be empty"));
            }
            if role.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(Error::config(format!(
                    "signal role {} must have a non-empty keyword",
                    role.name
                )));
            }
        }
        if self.signal_a.name.eq_ignore_ascii_case(&self.signal_b.name) {
            return Err(Error::config(format!(
                "signal roles must have distinct names, both are {}",
                self.signal_a.name
            )));
        }

        let legacy = &self.legacy_positions;
        if legacy.marker == legacy.signal_a
            || legacy.marker == legacy.signal_b
            || legacy.signal_a == legacy.signal_b
        {
            return Err(Error::config("legacy stream positions must be pairwise distinct"));
        }
        Ok(())
    }
}

/// Mapping from a numeric marker code to a human label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeLabel {
    /// Numeric marker code.
    pub code: f64,
    /// Label that replaces the code.
    pub label: String,
}

impl CodeLabel {
    pub fn new(code: f64, label: &str) -> Self {
        Self {
            code,
            label: label.to_string(),
        }
    }
}

/// Marker normalizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Drop markers whose value is the "no event" zero.
    pub drop_zero_sentinel: bool,
    /// Known numeric codes, checked in order.
    pub code_labels: Vec<CodeLabel>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            drop_zero_sentinel: true,
            code_labels: vec![
                CodeLabel::new(10.0, "Experiment start"),
                CodeLabel::new(20.0, "Experiment end"),
            ],
        }
    }
}

impl NormalizerConfig {
    fn validate(&self) -> Result<()> {
        for (i, entry) in self.code_labels.iter().enumerate() {
            if !entry.code.is_finite() {
                return Err(Error::config(format!("marker code #{i} is not finite")));
            }
            if entry.label.is_empty() {
                return Err(Error::config(format!(
                    "marker code {} has an empty label",
                    entry.code
                )));
            }
            // A numeric label would be coerced and remapped on a second pass.
            if entry.label.trim().parse::<f64>().is_ok() {
                return Err(Error::config(format!(
                    "marker code {} has a numeric label {:?}",
                    entry.code, entry.label
                )));
            }
            if self.code_labels[..i].iter().any(|prev| prev.code == entry.code) {
                return Err(Error::config(format!(
                    "marker code {} is mapped more than once",
                    entry.code
                )));
            }
        }
        Ok(())
    }
}
