//! Best-effort text extraction from loosely structured stream metadata.
//!
//! Recording headers are inconsistent: a field can be missing, a plain
//! string, a one-element list (as XDF loaders produce) or a nested record.
//! Everything here degrades to an empty string instead of failing.

use serde_json::{Map, Value};

/// Sub-fields of a nested record, in preference order: human-readable
/// text, then name, then generic value.
const RECORD_SUBFIELDS: [&str; 4] = ["#text", "text", "name", "value"];

/// Keys tried, in order, for the description field.
const DESCRIPTION_KEYS: [&str; 2] = ["description", "desc"];

/// Text of `key` in a metadata record; empty when absent.
pub fn field_text(metadata: &Value, key: &str) -> String {
    metadata
        .as_object()
        .and_then(|fields| fields.get(key))
        .map(value_text)
        .unwrap_or_default()
}

/// Text representation of a metadata value.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => join_texts(items.iter()),
        Value::Object(record) => record_text(record),
    }
}

fn record_text(record: &Map<String, Value>) -> String {
    RECORD_SUBFIELDS
        .iter()
        .filter_map(|key| record.get(*key))
        .map(value_text)
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| join_texts(record.values()))
}

fn join_texts<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    values
        .map(value_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-cased name/type/description text of one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub name: String,
    pub kind: String,
    pub description: String,
}

impl StreamDescriptor {
    /// Extract the descriptor from a metadata record.
    pub fn from_metadata(metadata: &Value) -> Self {
        let description = DESCRIPTION_KEYS
            .iter()
            .map(|key| field_text(metadata, key))
            .find(|text| !text.is_empty())
            .unwrap_or_default();

        Self {
            name: field_text(metadata, "name").to_lowercase(),
            kind: field_text(metadata, "type").to_lowercase(),
            description: description.to_lowercase(),
        }
    }

    /// Whether any field contains any of the (lower-case) keywords.
    pub fn mentions_any(&self, keywords: &[String]) -> bool {
        keywords
            .iter()
            .filter(|k| !k.is_empty())
            .any(|k| {
                self.name.contains(k.as_str())
                    || self.kind.contains(k.as_str())
                    || self.description.contains(k.as_str())
            })
    }

    /// Whether all fields are empty.
    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.kind.is_empty() && self.description.is_empty()
    }
}
