//! Identifier pseudonymization for sensitive records
//!
//! Direct identifiers (Kenyan mobile numbers, national ID numbers, email
//! addresses) inside string or number values are replaced with a stable token
//! `[REDACTED:<kind>:sha<8 hex of sha256>]`. Identifier fields are dropped at
//! every nesting level.
//! The same identifier always maps to the same token, so records stay
//! linkable without exposing the value.

use regex::Regex;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::domain::Record;

/// Field names that hold a personal identifier outright
pub const IDENTIFIER_FIELDS: &[&str] = &[
    "national_id",
    "id_number",
    "phone",
    "phone_number",
    "msisdn",
    "email",
    "home_address",
    "date_of_birth",
    "kra_pin",
];

/// Whether a field name holds a personal identifier outright
pub fn is_identifier_field(name: &str) -> bool {
    IDENTIFIER_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(name))
}

/// First identifier field name found in a value, searching nested objects and arrays
pub fn find_identifier_field(value: &JsonValue) -> Option<&str> {
    match value {
        JsonValue::Object(map) => map.iter().find_map(|(k, v)| {
            if is_identifier_field(k) {
                Some(k.as_str())
            } else {
                find_identifier_field(v)
            }
        }),
        JsonValue::Array(items) => items.iter().find_map(find_identifier_field),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Phone,
    NationalId,
    Email,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Phone => "phone",
            IdentifierKind::NationalId => "national_id",
            IdentifierKind::Email => "email",
        }
    }
}

/// Compiled identifier patterns
///
/// One alternation so that redaction is a single pass and a token is never
/// rewritten. Email comes first so a number inside an address is not split off.
pub struct IdentifierPatterns {
    combined: Regex,
}

impl Default for IdentifierPatterns {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierPatterns {
    pub fn new() -> Self {
        let combined = Regex::new(concat!(
            r"(?P<email>[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})",
            r"|(?P<phone>(?:\+254 ?|\b0)[17]\d{2}[ -]?\d{3}[ -]?\d{3}\b)",
            r"|(?P<national_id>\b\d{8}\b)",
        ))
        .expect("identifier pattern is valid");
        Self { combined }
    }

    /// Kind of the leftmost identifier in the text, if any
    pub fn first_match(&self, text: &str) -> Option<IdentifierKind> {
        self.combined.captures(text).map(|caps| kind_of(&caps))
    }

    /// Replace every identifier in `text` with its pseudonym token
    pub fn redact(&self, text: &str) -> String {
        self.combined
            .replace_all(text, |caps: &regex::Captures| pseudonym(kind_of(caps), &caps[0]))
            .into_owned()
    }
}

fn kind_of(caps: &regex::Captures) -> IdentifierKind {
    if caps.name("email").is_some() {
        IdentifierKind::Email
    } else if caps.name("phone").is_some() {
        IdentifierKind::Phone
    } else {
        IdentifierKind::NationalId
    }
}

/// Stable token for an identifier value
///
/// The digest is glued to a letter so its digits never form a match of their own.
pub fn pseudonym(kind: IdentifierKind, value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    format!("[REDACTED:{}:sha{}]", kind.as_str(), &hex::encode(digest)[..8])
}

/// Pseudonymizes identifiers in records
#[derive(Default)]
pub struct Anonymizer {
    patterns: IdentifierPatterns,
}

impl Anonymizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop identifier fields and redact identifiers found in values
    pub fn anonymize(&self, record: &Record) -> Record {
        let mut map = record.as_map().clone();
        map.retain(|name, _| !is_identifier_field(name));
        for (_, value) in map.iter_mut() {
            self.redact_value(value);
        }
        Record::from(map)
    }

    fn redact_value(&self, value: &mut JsonValue) {
        match value {
            JsonValue::String(s) => *s = self.patterns.redact(s),
            JsonValue::Number(n) => {
                // Numbers are matched on their decimal form, as the classifier reads them
                let text = n.to_string();
                if self.patterns.first_match(&text).is_some() {
                    *value = JsonValue::String(self.patterns.redact(&text));
                }
            }
            JsonValue::Array(items) => items.iter_mut().for_each(|v| self.redact_value(v)),
            JsonValue::Object(map) => {
                map.retain(|name, _| !is_identifier_field(name));
                for (_, v) in map.iter_mut() {
                    self.redact_value(v);
                }
            }
            JsonValue::Bool(_) | JsonValue::Null => {}
        }
    }
}
