//! Core data types for the physio-timeline system.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Timestamp in seconds on the recording clock.
pub type Seconds = f64;

/// A single scalar cell of a stream sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Numeric cell.
    Number(f64),
    /// String token.
    Text(String),
}

impl Scalar {
    /// Is this a string token?
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, Scalar::Text(_))
    }

    /// Numeric value, parsing string tokens when possible.
    pub fn parse_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Numeric value for plotting; unparseable text becomes NaN.
    #[inline]
    pub fn to_f64_lossy(&self) -> f64 {
        self.parse_number().unwrap_or(f64::NAN)
    }
}

/// One sample of a stream: a scalar or a fixed-width tuple of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sample {
    /// Single-channel sample.
    Scalar(Scalar),
    /// Multi-channel sample.
    Tuple(Vec<Scalar>),
}

impl Sample {
    /// First column of the sample (`None` for an empty tuple).
    pub fn first(&self) -> Option<&Scalar> {
        match self {
            Sample::Scalar(s) => Some(s),
            Sample::Tuple(cols) => cols.first(),
        }
    }

    /// Whether the sample carries a string token in its first column.
    pub fn is_text(&self) -> bool {
        self.first().is_some_and(Scalar::is_text)
    }
}

impl From<f64> for Sample {
    fn from(value: f64) -> Self {
        Sample::Scalar(Scalar::Number(value))
    }
}

impl From<&str> for Sample {
    fn from(value: &str) -> Self {
        Sample::Scalar(Scalar::Text(value.to_string()))
    }
}

/// One stream as handed over by the ingestion layer.
///
/// `metadata` is free-form: any field may be missing, a plain scalar,
/// a list, or a nested record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStream {
    /// Stream header (name, type, desc...).
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Sample timestamps, non-decreasing.
    #[serde(default)]
    pub timestamps: Vec<Seconds>,
    /// Samples, parallel to `timestamps`.
    #[serde(default)]
    pub samples: Vec<Sample>,
}

impl RawStream {
    /// Create a stream from its parts.
    pub fn new(metadata: serde_json::Value, timestamps: Vec<Seconds>, samples: Vec<Sample>) -> Self {
        Self {
            metadata,
            timestamps,
            samples,
        }
    }

    /// First sample, if any.
    #[inline]
    pub fn first_sample(&self) -> Option<&Sample> {
        self.samples.first()
    }

    /// Whether the first sample is a string token.
    #[inline]
    pub fn has_text_payload(&self) -> bool {
        self.first_sample().is_some_and(Sample::is_text)
    }
}

/// Parse a stream dump: a JSON array of stream records.
pub fn streams_from_json_str(json: &str) -> Result<Vec<RawStream>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let serde_json::Value::Array(records) = value else {
        return Err(Error::data("stream dump must be a JSON array of streams"));
    };
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            serde_json::from_value(record)
                .map_err(|e| Error::data(format!("stream #{i} is malformed: {e}")))
        })
        .collect()
}

/// Load a stream dump file.
pub fn load_streams(path: impl AsRef<Path>) -> Result<Vec<RawStream>> {
    let contents = std::fs::read_to_string(path)?;
    streams_from_json_str(&contents)
}

/// Semantic role of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamRole {
    /// Discrete marker/event channel.
    Marker,
    /// First continuous signal (ECG-like).
    SignalA,
    /// Second continuous signal (GSR-like).
    SignalB,
}

impl StreamRole {
    /// All roles in claiming order.
    pub const ALL: [StreamRole; 3] = [StreamRole::Marker, StreamRole::SignalA, StreamRole::SignalB];

    /// Stable role key.
    pub fn as_str(self) -> &'static str {
        match self {
            StreamRole::Marker => "marker",
            StreamRole::SignalA => "signalA",
            StreamRole::SignalB => "signalB",
        }
    }
}

impl fmt::Display for StreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Stream index chosen for each role; `None` means unassigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub marker: Option<usize>,
    pub signal_a: Option<usize>,
    pub signal_b: Option<usize>,
}

impl RoleAssignment {
    /// Index assigned to a role.
    pub fn get(&self, role: StreamRole) -> Option<usize> {
        match role {
            StreamRole::Marker => self.marker,
            StreamRole::SignalA => self.signal_a,
            StreamRole::SignalB => self.signal_b,
        }
    }

    /// Assign an index to a role.
    pub fn set(&mut self, role: StreamRole, index: usize) {
        match role {
            StreamRole::Marker => self.marker = Some(index),
            StreamRole::SignalA => self.signal_a = Some(index),
            StreamRole::SignalB => self.signal_b = Some(index),
        }
    }

    /// Role currently holding `index`, if any.
    pub fn role_of(&self, index: usize) -> Option<StreamRole> {
        StreamRole::ALL
            .into_iter()
            .find(|&role| self.get(role) == Some(index))
    }

    /// Whether `index` is held by some role.
    #[inline]
    pub fn is_claimed(&self, index: usize) -> bool {
        self.role_of(index).is_some()
    }

    /// Resolve the stream for a role.
    pub fn stream<'a>(&self, role: StreamRole, streams: &'a [RawStream]) -> Option<&'a RawStream> {
        self.get(role).and_then(|i| streams.get(i))
    }
}

/// Raw marker event: timestamp plus the first column of the sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMarkerEvent {
    pub timestamp: Seconds,
    pub value: Scalar,
}

impl RawMarkerEvent {
    /// Create a raw marker event.
    pub fn new(timestamp: Seconds, value: impl Into<Scalar>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

/// Marker value after type coercion.
///
/// Numbers compare numerically, text compares exactly, and a number
/// never equals a text value (`10.0 != "10"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerValue {
    Number(f64),
    Text(String),
}

impl MarkerValue {
    /// Text label constructor.
    pub fn text(label: impl Into<String>) -> Self {
        MarkerValue::Text(label.into())
    }

    /// Numeric value, if this is a number.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MarkerValue::Number(n) => Some(*n),
            MarkerValue::Text(_) => None,
        }
    }
}

impl fmt::Display for MarkerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerValue::Number(n) => write!(f, "{n}"),
            MarkerValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<MarkerValue> for Scalar {
    fn from(value: MarkerValue) -> Self {
        match value {
            MarkerValue::Number(n) => Scalar::Number(n),
            MarkerValue::Text(s) => Scalar::Text(s),
        }
    }
}

/// Normalized marker event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub timestamp: Seconds,
    pub label: MarkerValue,
}

impl NormalizedEvent {
    /// Create a normalized event.
    pub fn new(timestamp: Seconds, label: MarkerValue) -> Self {
        Self { timestamp, label }
    }
}

impl From<NormalizedEvent> for RawMarkerEvent {
    fn from(event: NormalizedEvent) -> Self {
        RawMarkerEvent {
            timestamp: event.timestamp,
            value: event.label.into(),
        }
    }
}

/// Series on the shared relative timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries<T> {
    /// Seconds since the shared origin.
    pub timestamps: Vec<Seconds>,
    /// Values, parallel to `timestamps`.
    pub values: Vec<T>,
}

impl<T> AlignedSeries<T> {
    /// Create a series from parallel vectors.
    pub fn new(timestamps: Vec<Seconds>, values: Vec<T>) -> Self {
        Self { timestamps, values }
    }

    /// Empty series ("no data").
    pub fn empty() -> Self {
        Self {
            timestamps: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Span between the first and last timestamp.
    pub fn duration(&self) -> Option<Seconds> {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(first), Some(last)) => Some(last - first),
            _ => None,
        }
    }

    /// Iterate `(timestamp, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Seconds, &T)> {
        self.timestamps.iter().copied().zip(self.values.iter())
    }
}

impl<T> Default for AlignedSeries<T> {
    fn default() -> Self {
        Self::empty()
    }
}
