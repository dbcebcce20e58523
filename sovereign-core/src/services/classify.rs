//! Sensitivity classifier
//!
//! Rules, evaluated on every record; the result is the most restrictive level
//! any rule produced:
//!
//! 1. Declared label (`data_sensitivity` or `sensitivity`). `public`,
//!    `sensitive` and `restricted`/`classified`/`confidential`/`secret` map
//!    directly. Purpose-scoped labels (`sensitive_public_interest`,
//!    `sensitive_research`, `sensitive_community`, `technical`) are public for
//!    the user type they are scoped to and sensitive for everyone else. Any
//!    other label is ambiguous and resolves to restricted.
//! 2. Government-restricted markers, as whole words, in the content text →
//!    restricted.
//! 3. Personal identifier fields at any depth, or Kenyan phone numbers, national
//!    ID numbers or email addresses in the content text → sensitive.
//! 4. Sensitive Kenyan topics → sensitive.
//! 5. No content-bearing field → ambiguous, resolves to restricted.
//!
//! Classification is deterministic and never fails. Ambiguity is reported on
//! the result, not raised.

use regex::Regex;
use serde::Serialize;

use crate::domain::{Record, SensitivityLevel, UserType};
use crate::services::anonymize::{find_identifier_field, is_identifier_field, IdentifierPatterns};

/// Fields that may declare a record's sensitivity
pub const DECLARED_LABEL_FIELDS: &[&str] = &["data_sensitivity", "sensitivity"];

const RESTRICTED_MARKERS: &[&str] = &[
    "classified",
    "top secret",
    "official secrets",
    "state secret",
    "security operation",
    "intelligence report",
];

const SENSITIVE_TOPICS: &[&str] = &[
    "tribal politics",
    "land disputes",
    "historical injustices",
    "election violence",
    "marginalized communities",
    "resource allocation",
    "devolution conflicts",
];

/// A rule that fired during classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub rule: &'static str,
    pub level: SensitivityLevel,
    pub detail: String,
}

/// Classification could not be decided cleanly and was resolved fail-closed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ambiguity {
    pub reason: String,
    pub resolved_to: SensitivityLevel,
}

/// Outcome of classifying one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub level: SensitivityLevel,
    pub signals: Vec<Signal>,
    pub ambiguity: Option<Ambiguity>,
}

impl Classification {
    pub fn is_ambiguous(&self) -> bool {
        self.ambiguity.is_some()
    }
}

/// Assigns a sensitivity level to records
pub struct SensitivityClassifier {
    patterns: IdentifierPatterns,
    restricted_markers: Regex,
}

impl Default for SensitivityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SensitivityClassifier {
    pub fn new() -> Self {
        Self {
            patterns: IdentifierPatterns::new(),
            restricted_markers: word_pattern(RESTRICTED_MARKERS),
        }
    }

    /// Classify a record for a given user type
    pub fn classify(&self, record: &Record, user_type: UserType) -> Classification {
        let mut signals = Vec::new();
        let mut ambiguity_reasons = Vec::new();

        let declared = declared_level(record, user_type);
        match &declared {
            Some(DeclaredLabel::Known(level, label)) => signals.push(Signal {
                rule: "declared_label",
                level: *level,
                detail: label.clone(),
            }),
            Some(DeclaredLabel::Unknown(label)) => {
                signals.push(Signal {
                    rule: "declared_label",
                    level: SensitivityLevel::Restricted,
                    detail: label.clone(),
                });
                ambiguity_reasons.push(format!("unrecognized sensitivity label '{}'", label));
            }
            None => {}
        }

        if !record.is_content_bearing() {
            signals.push(Signal {
                rule: "no_content",
                level: SensitivityLevel::Restricted,
                detail: "record has no content-bearing field".to_string(),
            });
            ambiguity_reasons.push("no content-bearing field to inspect".to_string());
        }

        let text = record.content_text();

        if let Some(marker) = self.restricted_markers.find(&text) {
            signals.push(Signal {
                rule: "restricted_marker",
                level: SensitivityLevel::Restricted,
                detail: marker.as_str().to_string(),
            });
        }

        let identifier_field = record.iter().find_map(|(name, value)| {
            if is_identifier_field(name) {
                Some(name)
            } else {
                find_identifier_field(value)
            }
        });
        if let Some(field) = identifier_field {
            signals.push(Signal {
                rule: "identifier_field",
                level: SensitivityLevel::Sensitive,
                detail: field.to_string(),
            });
        }

        if let Some(kind) = self.patterns.first_match(&text) {
            signals.push(Signal {
                rule: "identifier_pattern",
                level: SensitivityLevel::Sensitive,
                detail: kind.as_str().to_string(),
            });
        }

        if let Some(topic) = SENSITIVE_TOPICS.iter().find(|t| text.contains(*t)) {
            signals.push(Signal {
                rule: "sensitive_topic",
                level: SensitivityLevel::Sensitive,
                detail: topic.to_string(),
            });
        }

        let level = signals
            .iter()
            .map(|s| s.level)
            .max()
            .unwrap_or(SensitivityLevel::Public);

        if let Some(DeclaredLabel::Known(declared_level, label)) = &declared {
            if *declared_level < level {
                ambiguity_reasons.push(format!(
                    "declared '{}' but content indicates {}",
                    label, level
                ));
            }
        }

        let ambiguity = if ambiguity_reasons.is_empty() {
            None
        } else {
            Some(Ambiguity {
                reason: ambiguity_reasons.join("; "),
                resolved_to: level,
            })
        };

        Classification {
            level,
            signals,
            ambiguity,
        }
    }
}

/// Whole-word alternation of lowercase phrases; a space matches any whitespace run
fn word_pattern(phrases: &[&str]) -> Regex {
    let alternation = phrases
        .iter()
        .map(|p| regex::escape(p).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{})\b", alternation)).expect("marker pattern is valid")
}

enum DeclaredLabel {
    Known(SensitivityLevel, String),
    Unknown(String),
}

fn declared_level(record: &Record, user_type: UserType) -> Option<DeclaredLabel> {
    let value = DECLARED_LABEL_FIELDS.iter().find_map(|f| record.get(f))?;
    let label = match value.as_str() {
        Some(s) => s.trim().to_lowercase(),
        None => return Some(DeclaredLabel::Unknown(value.to_string())),
    };

    let scoped = |owner: UserType| {
        if user_type == owner {
            SensitivityLevel::Public
        } else {
            SensitivityLevel::Sensitive
        }
    };

    let level = match label.as_str() {
        "public" => SensitivityLevel::Public,
        "sensitive" => SensitivityLevel::Sensitive,
        "restricted" | "classified" | "confidential" | "secret" => SensitivityLevel::Restricted,
        "sensitive_public_interest" => scoped(UserType::Journalist),
        "sensitive_research" => scoped(UserType::Researcher),
        "sensitive_community" => scoped(UserType::Ngo),
        "technical" => scoped(UserType::Developer),
        _ => return Some(DeclaredLabel::Unknown(label)),
    };

    Some(DeclaredLabel::Known(level, label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn level_of(value: serde_json::Value, user_type: UserType) -> SensitivityLevel {
        SensitivityClassifier::new()
            .classify(&record(value), user_type)
            .level
    }

    #[test]
    fn test_plain_content_is_public() {
        let c = SensitivityClassifier::new().classify(
            &record(json!({"query": "Nairobi roads", "results": []})),
            UserType::Journalist,
        );
        assert_eq!(c.level, SensitivityLevel::Public);
        assert!(c.signals.is_empty());
        assert!(!c.is_ambiguous());
    }

    #[test]
    fn test_declared_labels() {
        assert_eq!(
            level_of(json!({"content": "x", "data_sensitivity": "public"}), UserType::Ngo),
            SensitivityLevel::Public
        );
        assert_eq!(
            level_of(json!({"content": "x", "data_sensitivity": "Sensitive"}), UserType::Ngo),
            SensitivityLevel::Sensitive
        );
        assert_eq!(
            level_of(json!({"content": "x", "sensitivity": "confidential"}), UserType::Ngo),
            SensitivityLevel::Restricted
        );
    }

    #[test]
    fn test_purpose_scoped_labels_depend_on_user_type() {
        let value = json!({"content": "x", "data_sensitivity": "sensitive_public_interest"});
        assert_eq!(level_of(value.clone(), UserType::Journalist), SensitivityLevel::Public);
        assert_eq!(level_of(value, UserType::Developer), SensitivityLevel::Sensitive);

        let value = json!({"content": "x", "data_sensitivity": "technical"});
        assert_eq!(level_of(value.clone(), UserType::Developer), SensitivityLevel::Public);
        assert_eq!(level_of(value, UserType::Researcher), SensitivityLevel::Sensitive);
    }

    #[test]
    fn test_unknown_label_fails_closed() {
        let c = SensitivityClassifier::new().classify(
            &record(json!({"content": "x", "data_sensitivity": "internal"})),
            UserType::Researcher,
        );
        assert_eq!(c.level, SensitivityLevel::Restricted);
        assert!(c.ambiguity.unwrap().reason.contains("internal"));
    }

    #[test]
    fn test_non_string_label_fails_closed() {
        let c = SensitivityClassifier::new().classify(
            &record(json!({"content": "x", "data_sensitivity": 3})),
            UserType::Researcher,
        );
        assert_eq!(c.level, SensitivityLevel::Restricted);
        assert!(c.is_ambiguous());
    }

    #[test]
    fn test_no_content_field_fails_closed() {
        let c = SensitivityClassifier::new().classify(
            &record(json!({"timestamp": "2024-01-01"})),
            UserType::Ngo,
        );
        assert_eq!(c.level, SensitivityLevel::Restricted);
        assert!(c.is_ambiguous());
    }

    #[test]
    fn test_restricted_marker() {
        assert_eq!(
            level_of(json!({"content": "Leaked Intelligence Report on border"}), UserType::Journalist),
            SensitivityLevel::Restricted
        );
    }

    #[test]
    fn test_restricted_markers_match_whole_words() {
        assert_eq!(
            level_of(json!({"content": "Declassified archive of the 1982 coup"}), UserType::Researcher),
            SensitivityLevel::Public
        );
        assert_eq!(
            level_of(json!({"title": "Market listings", "classified_ads": 12}), UserType::Developer),
            SensitivityLevel::Public
        );
        assert_eq!(
            level_of(json!({"content": "marked TOP\n  SECRET by the ministry"}), UserType::Ngo),
            SensitivityLevel::Restricted
        );
        assert_eq!(
            level_of(json!({"content": "a classified memo"}), UserType::Ngo),
            SensitivityLevel::Restricted
        );
    }

    #[test]
    fn test_nested_identifier_field_is_sensitive() {
        let c = SensitivityClassifier::new().classify(
            &record(json!({"content": "Clinic visits", "results": [{"phone_number": "0712 345 678"}]})),
            UserType::Ngo,
        );
        assert_eq!(c.level, SensitivityLevel::Sensitive);
        assert!(c
            .signals
            .iter()
            .any(|s| s.rule == "identifier_field" && s.detail == "phone_number"));
    }

    #[test]
    fn test_identifiers_are_sensitive() {
        assert_eq!(
            level_of(json!({"content": "call 0712345678 for details"}), UserType::Ngo),
            SensitivityLevel::Sensitive
        );
        assert_eq!(
            level_of(json!({"content": "reach +254112345678"}), UserType::Ngo),
            SensitivityLevel::Sensitive
        );
        assert_eq!(
            level_of(json!({"content": "ID 12345678 recorded"}), UserType::Ngo),
            SensitivityLevel::Sensitive
        );
        assert_eq!(
            level_of(json!({"content": "write to wanjiku@example.co.ke"}), UserType::Ngo),
            SensitivityLevel::Sensitive
        );
        assert_eq!(
            level_of(json!({"content": "x", "phone_number": "redacted"}), UserType::Ngo),
            SensitivityLevel::Sensitive
        );
    }

    #[test]
    fn test_sensitive_topic() {
        assert_eq!(
            level_of(json!({"title": "Land disputes in Nakuru"}), UserType::Researcher),
            SensitivityLevel::Sensitive
        );
    }

    #[test]
    fn test_declared_public_overridden_by_content() {
        let c = SensitivityClassifier::new().classify(
            &record(json!({"content": "call 0712345678", "data_sensitivity": "public"})),
            UserType::Journalist,
        );
        assert_eq!(c.level, SensitivityLevel::Sensitive);
        assert!(c.ambiguity.unwrap().reason.contains("declared 'public'"));
    }

    #[test]
    fn test_deterministic() {
        let classifier = SensitivityClassifier::new();
        let r = record(json!({"content": "Election violence report, call 0712345678"}));
        let first = classifier.classify(&r, UserType::Researcher);
        for _ in 0..5 {
            assert_eq!(classifier.classify(&r, UserType::Researcher), first);
        }
    }
}
