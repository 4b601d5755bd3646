//! Helpers for the display layer: per-role summary lines and a stable
//! label → rank table used to lay markers out vertically.

use ordered_float::OrderedFloat;
use physio_core::{AlignedSeries, MarkerValue};
use serde::{Serialize, Serializer};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// `"<role> samples: <n>, duration: <d>s"`, or `"No <role> data"`.
pub fn series_summary<T>(role_name: &str, series: &AlignedSeries<T>) -> String {
    match series.duration() {
        Some(duration) => format!(
            "{} samples: {}, duration: {:.2}s",
            role_name,
            series.len(),
            duration
        ),
        None => format!("No {} data", role_name),
    }
}

/// Hashable form of a marker label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LabelKey {
    Number(OrderedFloat<f64>),
    Text(String),
}

impl From<&MarkerValue> for LabelKey {
    fn from(value: &MarkerValue) -> Self {
        match value {
            MarkerValue::Number(n) => LabelKey::Number(OrderedFloat(*n)),
            MarkerValue::Text(s) => LabelKey::Text(s.clone()),
        }
    }
}

/// Distinct labels ranked by first appearance.
///
/// A NaN label never equals another label, so every NaN occurrence gets
/// its own rank.
#[derive(Debug, Clone, Default)]
pub struct LabelRanks {
    /// Distinct labels in first-seen order.
    labels: Vec<MarkerValue>,
    ranks: HashMap<LabelKey, usize>,
    /// Ranks of the NaN occurrences, in sequence order.
    nan_ranks: Vec<usize>,
}

fn is_nan(label: &MarkerValue) -> bool {
    label.as_number().is_some_and(f64::is_nan)
}

impl LabelRanks {
    /// Build the rank table from a label sequence.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a MarkerValue>) -> Self {
        let mut table = Self::default();
        for label in labels {
            let next = table.labels.len();
            if is_nan(label) {
                table.nan_ranks.push(next);
                table.labels.push(label.clone());
            } else if let Entry::Vacant(slot) = table.ranks.entry(LabelKey::from(label)) {
                slot.insert(next);
                table.labels.push(label.clone());
            }
        }
        table
    }

    /// Rank of a label; `None` for unknown labels and for NaN, which has
    /// no single rank.
    pub fn rank(&self, label: &MarkerValue) -> Option<usize> {
        if is_nan(label) {
            return None;
        }
        self.ranks.get(&LabelKey::from(label)).copied()
    }

    /// Rank of every event in a marker series. The series must be the one
    /// the table was built from.
    pub fn positions(&self, markers: &AlignedSeries<MarkerValue>) -> Vec<usize> {
        let mut nan_ranks = self.nan_ranks.iter().copied();
        markers
            .values
            .iter()
            .filter_map(|label| {
                if is_nan(label) {
                    nan_ranks.next()
                } else {
                    self.rank(label)
                }
            })
            .collect()
    }

    /// Distinct labels in rank order.
    pub fn labels(&self) -> &[MarkerValue] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Serialize for LabelRanks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.labels.serialize(serializer)
    }
}
