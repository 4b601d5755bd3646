//! Marker stream normalization.
//!
//! Turns the raw marker channel into an ordered sequence of labeled events:
//! values are coerced to numbers where possible, "no event" zeros are
//! dropped, known numeric codes become human labels and runs of the same
//! label collapse to their first occurrence. Input order is preserved.

use physio_core::config::{CodeLabel, NormalizerConfig};
use physio_core::{MarkerValue, NormalizedEvent, RawMarkerEvent, RawStream, Scalar, Seconds};
use tracing::debug;

/// Counters describing one normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationStats {
    /// Events entering the normalizer.
    pub raw_events: usize,
    /// Values dropped by length reconciliation.
    pub truncated: usize,
    /// Zero sentinels removed.
    pub dropped_sentinels: usize,
    /// Events absorbed into a preceding run of the same label.
    pub collapsed: usize,
    /// Events emitted.
    pub emitted: usize,
}

/// First column of every marker sample.
///
/// Only the first column of multi-column samples is kept. An empty tuple
/// yields an empty text value.
pub fn marker_values(stream: &RawStream) -> Vec<Scalar> {
    stream
        .samples
        .iter()
        .map(|sample| sample.first().cloned().unwrap_or_else(|| Scalar::Text(String::new())))
        .collect()
}

/// Pair timestamps with values, truncating both to the shorter length.
fn reconcile(timestamps: &[Seconds], values: &[Scalar]) -> (Vec<RawMarkerEvent>, usize) {
    let n = timestamps.len().min(values.len());
    let truncated = timestamps.len().max(values.len()) - n;
    if truncated > 0 {
        debug!(
            timestamps = timestamps.len(),
            values = values.len(),
            "marker timestamp/value length mismatch, truncating"
        );
    }

    let events = timestamps[..n]
        .iter()
        .zip(&values[..n])
        .map(|(&timestamp, value)| RawMarkerEvent {
            timestamp,
            value: value.clone(),
        })
        .collect();
    (events, truncated)
}

/// Coerce a raw value: numbers stay numbers, numeric strings become
/// numbers, anything else is kept as the original text.
pub fn coerce(value: &Scalar) -> MarkerValue {
    match value {
        Scalar::Number(n) => MarkerValue::Number(*n),
        Scalar::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) => MarkerValue::Number(n),
            Err(_) => MarkerValue::Text(s.clone()),
        },
    }
}

/// Whether a coerced value is the "no event" zero.
pub fn is_zero_sentinel(value: &MarkerValue) -> bool {
    match value {
        MarkerValue::Number(n) => *n == 0.0,
        MarkerValue::Text(s) => s.trim() == "0",
    }
}

/// Collapse runs of equal consecutive labels to their first event.
///
/// Each event is compared to the last *emitted* label.
pub fn collapse_runs(events: impl IntoIterator<Item = NormalizedEvent>) -> Vec<NormalizedEvent> {
    events.into_iter().fold(Vec::new(), |mut emitted, event| {
        if emitted.last().map(|last: &NormalizedEvent| &last.label) != Some(&event.label) {
            emitted.push(event);
        }
        emitted
    })
}

/// Marker normalizer.
pub struct MarkerNormalizer {
    /// Drop zero sentinels.
    drop_zero_sentinel: bool,
    /// Known numeric codes.
    code_labels: Vec<CodeLabel>,
}

impl MarkerNormalizer {
    /// Create a normalizer from configuration.
    pub fn new(config: &NormalizerConfig) -> Self {
        Self {
            drop_zero_sentinel: config.drop_zero_sentinel,
            code_labels: config.code_labels.clone(),
        }
    }

    /// Replace a known numeric code by its label; everything else passes.
    pub fn map_code(&self, value: MarkerValue) -> MarkerValue {
        let Some(n) = value.as_number() else {
            return value;
        };
        self.code_labels
            .iter()
            .find(|entry| entry.code == n)
            .map(|entry| MarkerValue::Text(entry.label.clone()))
            .unwrap_or(value)
    }

    /// Normalize a raw event sequence.
    pub fn normalize(&self, events: &[RawMarkerEvent]) -> Vec<NormalizedEvent> {
        self.normalize_with_stats(events).0
    }

    /// Normalize parallel timestamp/value columns. Extra timestamps or
    /// values are dropped and counted in `truncated`.
    pub fn normalize_columns(
        &self,
        timestamps: &[Seconds],
        values: &[Scalar],
    ) -> (Vec<NormalizedEvent>, NormalizationStats) {
        let (events, truncated) = reconcile(timestamps, values);
        let (normalized, mut stats) = self.normalize_with_stats(&events);
        stats.truncated = truncated;
        debug!(?stats, "marker columns normalized");
        (normalized, stats)
    }

    /// Normalize the marker stream of a recording.
    pub fn normalize_stream(&self, stream: &RawStream) -> (Vec<NormalizedEvent>, NormalizationStats) {
        self.normalize_columns(&stream.timestamps, &marker_values(stream))
    }

    /// Normalize a raw event sequence, reporting what each stage removed.
    pub fn normalize_with_stats(&self, events: &[RawMarkerEvent]) -> (Vec<NormalizedEvent>, NormalizationStats) {
        let mut stats = NormalizationStats {
            raw_events: events.len(),
            ..Default::default()
        };

        let retained: Vec<NormalizedEvent> = events
            .iter()
            .map(|event| (event.timestamp, coerce(&event.value)))
            .filter(|(_, value)| !(self.drop_zero_sentinel && is_zero_sentinel(value)))
            .map(|(timestamp, value)| NormalizedEvent::new(timestamp, self.map_code(value)))
            .collect();
        stats.dropped_sentinels = events.len() - retained.len();

        let retained_count = retained.len();
        let emitted = collapse_runs(retained);
        stats.collapsed = retained_count - emitted.len();
        stats.emitted = emitted.len();

        (emitted, stats)
    }
}

impl Default for MarkerNormalizer {
    fn default() -> Self {
        Self::new(&NormalizerConfig::default())
    }
}
