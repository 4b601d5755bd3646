//! Pipeline engine.
//!
//! Runs classification, marker normalization and alignment over one
//! recording and packages the result for display.

use crate::aligner;
use crate::presentation::{series_summary, LabelRanks};
use physio_core::{
    AlignedSeries, Config, MarkerValue, RawStream, Scalar, Seconds, StreamRole,
};
use physio_ingestion::{Classification, MarkerNormalizer, StreamClassifier};
use serde::Serialize;
use tracing::{debug, info};

/// A recording on the shared relative timeline.
#[derive(Debug, Clone, Serialize)]
pub struct AlignedRecording {
    /// Role assignment and the rules behind it.
    pub classification: Classification,
    /// Absolute time mapped to zero.
    pub origin: Seconds,
    /// Display name of signal A (e.g., "ECG").
    pub signal_a_name: String,
    /// Display name of signal B (e.g., "GSR").
    pub signal_b_name: String,
    pub signal_a: AlignedSeries<f64>,
    pub signal_b: AlignedSeries<f64>,
    /// Normalized marker events.
    pub markers: AlignedSeries<MarkerValue>,
    /// Distinct marker labels in first-seen order.
    pub label_ranks: LabelRanks,
}

impl AlignedRecording {
    /// Series and display name of a signal role.
    pub fn signal(&self, role: StreamRole) -> Option<(&str, &AlignedSeries<f64>)> {
        match role {
            StreamRole::SignalA => Some((self.signal_a_name.as_str(), &self.signal_a)),
            StreamRole::SignalB => Some((self.signal_b_name.as_str(), &self.signal_b)),
            StreamRole::Marker => None,
        }
    }

    /// Summary line of a signal role (`None` for the marker role).
    pub fn summary(&self, role: StreamRole) -> Option<String> {
        self.signal(role)
            .map(|(name, series)| series_summary(name, series))
    }

    /// Rank of each marker event, for vertical layout.
    pub fn marker_positions(&self) -> Vec<usize> {
        self.label_ranks.positions(&self.markers)
    }
}

/// Timestamps and first-column values of a continuous stream, truncated to
/// a common length. Text cells that do not parse become NaN.
pub fn signal_columns(stream: &RawStream) -> (Vec<Seconds>, Vec<f64>) {
    let n = stream.timestamps.len().min(stream.samples.len());
    let values = stream.samples[..n]
        .iter()
        .map(|sample| sample.first().map_or(f64::NAN, Scalar::to_f64_lossy))
        .collect();
    (stream.timestamps[..n].to_vec(), values)
}

/// Classify → normalize → align engine.
pub struct Pipeline {
    classifier: StreamClassifier,
    normalizer: MarkerNormalizer,
    signal_a_name: String,
    signal_b_name: String,
}

impl Pipeline {
    /// Create a pipeline from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            classifier: StreamClassifier::new(&config.classifier),
            normalizer: MarkerNormalizer::new(&config.normalizer),
            signal_a_name: config.classifier.signal_a.name.clone(),
            signal_b_name: config.classifier.signal_b.name.clone(),
        }
    }

    /// Run the pipeline over a recording. Missing roles come back as empty
    /// series.
    pub fn run(&self, streams: &[RawStream]) -> AlignedRecording {
        let classification = self.classifier.classify(streams);
        let assignment = classification.assignment;

        let (a_ts, a_values) = assignment
            .stream(StreamRole::SignalA, streams)
            .map(signal_columns)
            .unwrap_or_default();
        let (b_ts, b_values) = assignment
            .stream(StreamRole::SignalB, streams)
            .map(signal_columns)
            .unwrap_or_default();

        let (events, marker_stats) = assignment
            .stream(StreamRole::Marker, streams)
            .map(|stream| self.normalizer.normalize_stream(stream))
            .unwrap_or_default();
        let (marker_ts, labels): (Vec<Seconds>, Vec<MarkerValue>) = events
            .into_iter()
            .map(|event| (event.timestamp, event.label))
            .unzip();

        let aligned = aligner::align(&a_ts, &b_ts, &marker_ts);
        debug!(origin = aligned.origin, "streams aligned");

        let markers = AlignedSeries::new(aligned.marker, labels);
        let label_ranks = LabelRanks::from_labels(&markers.values);

        let recording = AlignedRecording {
            classification,
            origin: aligned.origin,
            signal_a_name: self.signal_a_name.clone(),
            signal_b_name: self.signal_b_name.clone(),
            signal_a: AlignedSeries::new(aligned.signal_a, a_values),
            signal_b: AlignedSeries::new(aligned.signal_b, b_values),
            markers,
            label_ranks,
        };

        info!(
            streams = streams.len(),
            signal_a = recording.signal_a.len(),
            signal_b = recording.signal_b.len(),
            markers = recording.markers.len(),
            distinct_labels = recording.label_ranks.len(),
            dropped_sentinels = marker_stats.dropped_sentinels,
            truncated_markers = marker_stats.truncated,
            "recording processed"
        );

        recording
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
