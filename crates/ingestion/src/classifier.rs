//! Stream role inference from metadata and payload type.
//!
//! Assigns at most one stream each to the marker role and the two
//! continuous signal roles. Evidence is the lower-cased name/type/description
//! text and whether the first sample is a string token. The policy is a fixed
//! table of rules evaluated in order; a rule only fires for a role that is
//! still unassigned, and a stream index is never given to two roles.

use crate::metadata::StreamDescriptor;
use physio_core::config::{ClassifierConfig, LegacyPositions};
use physio_core::{RawStream, RoleAssignment, StreamRole};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How a rule picks its candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    /// Marker keyword in metadata, or a string payload; first over all streams.
    MarkerEvidence,
    /// Role keyword in metadata; first over all streams.
    Keyword,
    /// String payload; first unclaimed stream.
    TextPayload,
    /// Role keyword; first unclaimed numeric stream.
    PoolKeyword,
    /// First unclaimed numeric stream.
    PoolPosition,
    /// Fixed legacy index.
    LegacyIndex,
}

/// One entry of the classification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationRule {
    pub role: StreamRole,
    pub kind: RuleKind,
}

impl ClassificationRule {
    const fn new(role: StreamRole, kind: RuleKind) -> Self {
        Self { role, kind }
    }
}

/// The classification policy, in evaluation order.
pub const RULES: [ClassificationRule; 11] = [
    ClassificationRule::new(StreamRole::Marker, RuleKind::MarkerEvidence),
    ClassificationRule::new(StreamRole::SignalA, RuleKind::Keyword),
    ClassificationRule::new(StreamRole::SignalB, RuleKind::Keyword),
    ClassificationRule::new(StreamRole::Marker, RuleKind::TextPayload),
    ClassificationRule::new(StreamRole::SignalA, RuleKind::PoolKeyword),
    ClassificationRule::new(StreamRole::SignalB, RuleKind::PoolKeyword),
    ClassificationRule::new(StreamRole::SignalA, RuleKind::PoolPosition),
    ClassificationRule::new(StreamRole::SignalB, RuleKind::PoolPosition),
    ClassificationRule::new(StreamRole::Marker, RuleKind::LegacyIndex),
    ClassificationRule::new(StreamRole::SignalA, RuleKind::LegacyIndex),
    ClassificationRule::new(StreamRole::SignalB, RuleKind::LegacyIndex),
];

/// Classification evidence for one stream.
#[derive(Debug, Clone, Default)]
pub struct StreamProfile {
    /// Lower-cased metadata text.
    pub descriptor: StreamDescriptor,
    /// First sample is a string token.
    pub text_payload: bool,
}

impl StreamProfile {
    /// Build the profile of a stream.
    pub fn of(stream: &RawStream) -> Self {
        Self {
            descriptor: StreamDescriptor::from_metadata(&stream.metadata),
            text_payload: stream.has_text_payload(),
        }
    }
}

/// A role decision and the rule that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDecision {
    pub role: StreamRole,
    pub index: usize,
    pub rule: RuleKind,
}

/// Result of classifying a stream collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Final role assignment.
    pub assignment: RoleAssignment,
    /// Decisions in the order they were made.
    pub decisions: Vec<RoleDecision>,
}

impl Classification {
    /// Rule that assigned a role, if it was assigned.
    pub fn rule_for(&self, role: StreamRole) -> Option<RuleKind> {
        self.decisions
            .iter()
            .find(|d| d.role == role)
            .map(|d| d.rule)
    }

    /// Whether any role fell back to a legacy fixed index.
    pub fn used_legacy_positions(&self) -> bool {
        self.decisions.iter().any(|d| d.rule == RuleKind::LegacyIndex)
    }
}

/// Stream classifier.
pub struct StreamClassifier {
    /// Lower-cased marker keywords.
    marker_keywords: Vec<String>,
    /// Lower-cased signal A keywords.
    signal_a_keywords: Vec<String>,
    /// Lower-cased signal B keywords.
    signal_b_keywords: Vec<String>,
    /// Legacy positional defaults.
    legacy: LegacyPositions,
}

fn lowercased(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

impl StreamClassifier {
    /// Create a classifier from configuration.
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            marker_keywords: lowercased(&config.marker_keywords),
            signal_a_keywords: lowercased(&config.signal_a.keywords),
            signal_b_keywords: lowercased(&config.signal_b.keywords),
            legacy: config.legacy_positions.clone(),
        }
    }

    /// Keywords identifying a role.
    fn keywords(&self, role: StreamRole) -> &[String] {
        match role {
            StreamRole::Marker => &self.marker_keywords,
            StreamRole::SignalA => &self.signal_a_keywords,
            StreamRole::SignalB => &self.signal_b_keywords,
        }
    }

    /// Legacy index of a role.
    fn legacy_index(&self, role: StreamRole) -> usize {
        match role {
            StreamRole::Marker => self.legacy.marker,
            StreamRole::SignalA => self.legacy.signal_a,
            StreamRole::SignalB => self.legacy.signal_b,
        }
    }

    /// Classify a stream collection. Never fails; roles without evidence
    /// stay unassigned.
    pub fn classify(&self, streams: &[RawStream]) -> Classification {
        let profiles: Vec<StreamProfile> = streams.iter().map(StreamProfile::of).collect();
        self.classify_profiles(&profiles)
    }

    /// Classify precomputed stream profiles.
    pub fn classify_profiles(&self, profiles: &[StreamProfile]) -> Classification {
        let mut result = Classification::default();

        for rule in RULES {
            if result.assignment.get(rule.role).is_some() {
                continue;
            }
            if let Some(index) = self.apply_rule(rule, profiles, &result.assignment) {
                if rule.kind == RuleKind::LegacyIndex {
                    warn!(
                        role = %rule.role,
                        index,
                        "no classification evidence, falling back to legacy stream position"
                    );
                } else {
                    debug!(role = %rule.role, index, rule = ?rule.kind, "stream role assigned");
                }
                result.assignment.set(rule.role, index);
                result.decisions.push(RoleDecision {
                    role: rule.role,
                    index,
                    rule: rule.kind,
                });
            }
        }

        let blank = profiles.iter().filter(|p| p.descriptor.is_blank()).count();
        for role in StreamRole::ALL {
            if result.assignment.get(role).is_none() {
                debug!(
                    role = %role,
                    streams = profiles.len(),
                    blank_metadata = blank,
                    "stream role left unassigned"
                );
            }
        }

        result
    }

    /// Evaluate a single rule against the current assignment.
    ///
    /// Returns the index the rule would claim; `None` if nothing matches or
    /// the match is already held by another role.
    pub fn apply_rule(
        &self,
        rule: ClassificationRule,
        profiles: &[StreamProfile],
        assignment: &RoleAssignment,
    ) -> Option<usize> {
        let keywords = self.keywords(rule.role);
        let in_pool = |i: usize| !profiles[i].text_payload && !assignment.is_claimed(i);

        match rule.kind {
            RuleKind::MarkerEvidence | RuleKind::Keyword => {
                let found = profiles.iter().position(|p| {
                    p.descriptor.mentions_any(keywords)
                        || (rule.kind == RuleKind::MarkerEvidence && p.text_payload)
                })?;
                if let Some(holder) = assignment.role_of(found) {
                    debug!(
                        role = %rule.role,
                        index = found,
                        holder = %holder,
                        "metadata match already claimed"
                    );
                    return None;
                }
                Some(found)
            }
            RuleKind::TextPayload => (0..profiles.len())
                .find(|&i| profiles[i].text_payload && !assignment.is_claimed(i)),
            RuleKind::PoolKeyword => (0..profiles.len())
                .find(|&i| in_pool(i) && profiles[i].descriptor.mentions_any(keywords)),
            RuleKind::PoolPosition => (0..profiles.len()).find(|&i| in_pool(i)),
            RuleKind::LegacyIndex => {
                let index = self.legacy_index(rule.role);
                (self.legacy.enabled && index < profiles.len() && !assignment.is_claimed(index))
                    .then_some(index)
            }
        }
    }
}

impl Default for StreamClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physio_core::Sample;
    use serde_json::{json, Value};

    fn make_stream(metadata: Value, first: Sample) -> RawStream {
        RawStream::new(metadata, vec![0.0], vec![first])
    }

    fn numeric(metadata: Value) -> RawStream {
        make_stream(metadata, Sample::from(1.0))
    }

    fn text(metadata: Value) -> RawStream {
        make_stream(metadata, Sample::from("start"))
    }

    fn assert_no_double_assignment(assignment: &RoleAssignment) {
        let claimed: Vec<usize> = StreamRole::ALL
            .into_iter()
            .filter_map(|role| assignment.get(role))
            .collect();
        for (i, a) in claimed.iter().enumerate() {
            assert!(!claimed[i + 1..].contains(a), "index {a} assigned twice");
        }
    }

    #[test]
    fn test_empty_input() {
        let result = StreamClassifier::default().classify(&[]);
        assert_eq!(result.assignment, RoleAssignment::default());
        assert!(result.decisions.is_empty());
    }

    #[test]
    fn test_metadata_keywords() {
        let streams = vec![
            numeric(json!({"name": ["ShimmerGSR"], "type": ["GSR"]})),
            numeric(json!({"name": ["PolarH10"], "type": ["ECG"]})),
            numeric(json!({"name": ["PsychoPy"], "type": ["Markers"]})),
        ];
        let result = StreamClassifier::default().classify(&streams);

        assert_eq!(result.assignment.marker, Some(2));
        assert_eq!(result.assignment.signal_a, Some(1));
        assert_eq!(result.assignment.signal_b, Some(0));
        assert_eq!(result.rule_for(StreamRole::Marker), Some(RuleKind::MarkerEvidence));
        assert_eq!(result.rule_for(StreamRole::SignalB), Some(RuleKind::Keyword));
        assert!(!result.used_legacy_positions());
    }

    #[test]
    fn test_string_payload_is_marker_without_metadata() {
        let streams = vec![numeric(Value::Null), text(Value::Null), numeric(Value::Null)];
        let result = StreamClassifier::default().classify(&streams);

        assert_eq!(result.assignment.marker, Some(1));
        assert_eq!(result.assignment.signal_a, Some(0));
        assert_eq!(result.assignment.signal_b, Some(2));
        assert_eq!(result.rule_for(StreamRole::SignalA), Some(RuleKind::PoolPosition));
    }

    #[test]
    fn test_keyword_marker_precedes_later_string_stream() {
        let streams = vec![
            numeric(json!({"type": "event codes"})),
            text(json!({"name": "notes"})),
        ];
        let result = StreamClassifier::default().classify(&streams);
        assert_eq!(result.assignment.marker, Some(0));
    }

    #[test]
    fn test_string_stream_precedes_later_keyword_marker() {
        let streams = vec![text(Value::Null), numeric(json!({"name": "Markers"}))];
        let result = StreamClassifier::default().classify(&streams);
        assert_eq!(result.assignment.marker, Some(0));
        assert_eq!(result.assignment.signal_a, Some(1));
    }

    #[test]
    fn test_signal_match_on_marker_stream_falls_back_to_pool() {
        let streams = vec![
            text(json!({"name": "ECG events"})),
            numeric(json!({"name": "ecg lead II"})),
            numeric(json!({"desc": {"name": "electrodermal"}})),
        ];
        let result = StreamClassifier::default().classify(&streams);

        assert_eq!(result.assignment.marker, Some(0));
        assert_eq!(result.assignment.signal_a, Some(1));
        assert_eq!(result.rule_for(StreamRole::SignalA), Some(RuleKind::PoolKeyword));
        assert_eq!(result.assignment.signal_b, Some(2));
        assert_eq!(result.rule_for(StreamRole::SignalB), Some(RuleKind::Keyword));
    }

    #[test]
    fn test_same_stream_matches_both_signals() {
        let streams = vec![
            numeric(json!({"name": "ECG+GSR combo"})),
            numeric(json!({"name": "EDA"})),
        ];
        let result = StreamClassifier::default().classify(&streams);

        assert_eq!(result.assignment.signal_a, Some(0));
        assert_eq!(result.assignment.signal_b, Some(1));
        assert_eq!(result.rule_for(StreamRole::SignalB), Some(RuleKind::PoolKeyword));
        assert_no_double_assignment(&result.assignment);
    }

    #[test]
    fn test_legacy_marker_position() {
        // Legacy marker index is already held by signal B.
        let streams = vec![
            numeric(json!({"name": "ecg"})),
            numeric(json!({"name": "gsr"})),
        ];
        let result = StreamClassifier::default().classify(&streams);
        assert_eq!(result.assignment.marker, None);
        assert_eq!(result.assignment.signal_a, Some(0));
        assert_eq!(result.assignment.signal_b, Some(1));

        let mut config = ClassifierConfig::default();
        config.legacy_positions.marker = 3;
        let streams = vec![
            text(json!({"name": "a"})),
            text(json!({"name": "b"})),
            text(json!({"name": "c"})),
            text(json!({"name": "d"})),
        ];
        let result = StreamClassifier::new(&config).classify(&streams);
        assert_eq!(result.assignment.marker, Some(0));
        // Pool is empty (all text), so signal roles use legacy indices.
        assert_eq!(result.assignment.signal_a, None);
        assert_eq!(result.assignment.signal_b, Some(2));
        assert_eq!(result.rule_for(StreamRole::SignalB), Some(RuleKind::LegacyIndex));
        assert!(result.used_legacy_positions());
    }

    #[test]
    fn test_legacy_positions_disabled() {
        let mut config = ClassifierConfig::default();
        config.legacy_positions.enabled = false;
        let streams = vec![text(Value::Null), text(Value::Null), text(Value::Null)];
        let result = StreamClassifier::new(&config).classify(&streams);

        assert_eq!(result.assignment.marker, Some(0));
        assert_eq!(result.assignment.signal_a, None);
        assert_eq!(result.assignment.signal_b, None);
    }

    #[test]
    fn test_single_numeric_stream() {
        let result = StreamClassifier::default().classify(&[numeric(Value::Null)]);
        assert_eq!(result.assignment.signal_a, Some(0));
        assert_eq!(result.assignment.marker, None);
        assert_eq!(result.assignment.signal_b, None);
    }

    #[test]
    fn test_empty_streams_are_numeric_candidates() {
        let streams = vec![RawStream::default(), RawStream::default()];
        let result = StreamClassifier::default().classify(&streams);
        assert_eq!(result.assignment.signal_a, Some(0));
        assert_eq!(result.assignment.signal_b, Some(1));
        assert_eq!(result.assignment.marker, None);
    }

    #[test]
    fn test_custom_keywords_are_case_insensitive() {
        let mut config = ClassifierConfig::default();
        config.signal_a.keywords = vec!["PPG".to_string()];
        let streams = vec![
            numeric(json!({"name": "ecg"})),
            numeric(json!({"type": "ppg"})),
        ];
        let result = StreamClassifier::new(&config).classify(&streams);
        assert_eq!(result.assignment.signal_a, Some(1));
        assert_eq!(result.assignment.signal_b, Some(0));
    }

    #[test]
    fn test_rules_individually() {
        let classifier = StreamClassifier::default();
        let profiles: Vec<StreamProfile> = [
            text(json!({"name": "gsr notes"})),
            numeric(Value::Null),
            numeric(json!({"type": "GSR"})),
        ]
        .iter()
        .map(StreamProfile::of)
        .collect();

        let mut assignment = RoleAssignment::default();
        let rule = |role, kind| ClassificationRule::new(role, kind);

        assert_eq!(
            classifier.apply_rule(rule(StreamRole::SignalB, RuleKind::Keyword), &profiles, &assignment),
            Some(0)
        );
        assert_eq!(
            classifier.apply_rule(rule(StreamRole::SignalB, RuleKind::PoolKeyword), &profiles, &assignment),
            Some(2)
        );
        assert_eq!(
            classifier.apply_rule(rule(StreamRole::SignalA, RuleKind::PoolPosition), &profiles, &assignment),
            Some(1)
        );

        assignment.set(StreamRole::Marker, 0);
        assert_eq!(
            classifier.apply_rule(rule(StreamRole::SignalB, RuleKind::Keyword), &profiles, &assignment),
            None
        );
        assert_eq!(
            classifier.apply_rule(rule(StreamRole::Marker, RuleKind::TextPayload), &profiles, &assignment),
            None
        );
        assert_eq!(
            classifier.apply_rule(rule(StreamRole::SignalA, RuleKind::LegacyIndex), &profiles, &assignment),
            None
        );
        assert_eq!(
            classifier.apply_rule(rule(StreamRole::SignalB, RuleKind::LegacyIndex), &profiles, &assignment),
            Some(2)
        );
    }

    #[test]
    fn test_never_double_assigns() {
        let shapes = [
            json!(null),
            json!({"name": "marker ecg gsr"}),
            json!({"type": ["EDA"]}),
            json!({"desc": {"value": "ekg event"}}),
            json!({"name": {"#text": "Galvanic"}}),
        ];
        for (i, a) in shapes.iter().enumerate() {
            for b in shapes.iter().skip(i) {
                for first_text in [false, true] {
                    let mut streams = vec![numeric(a.clone()), numeric(b.clone())];
                    streams.push(if first_text { text(b.clone()) } else { numeric(a.clone()) });
                    streams.push(RawStream::default());
                    let result = StreamClassifier::default().classify(&streams);
                    assert_no_double_assignment(&result.assignment);
                }
            }
        }
    }
}
