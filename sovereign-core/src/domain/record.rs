//! Record domain model
//!
//! Collected data has no fixed schema: every source emits its own field set.
//! A [`Record`] is an ordered field map with typed accessors, and a
//! [`RecordSet`] is an ordered sequence of records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Fields that carry classifiable content. A record needs at least one.
pub const CONTENT_FIELDS: &[&str] = &[
    "content",
    "text",
    "title",
    "query",
    "description",
    "summary",
    "results",
];

/// One unit of collected information (query, source, content, timestamp, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, JsonValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, keeping its original position if it already exists
    pub fn with(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<JsonValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<JsonValue> {
        self.fields.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.fields.get(name)
    }

    /// Get a field as a string slice, if present and a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(JsonValue::as_str)
    }

    /// Get a field as a float, if present and numeric
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(JsonValue::as_f64)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut JsonValue)> {
        self.fields.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether the record has at least one content-bearing field
    pub fn is_content_bearing(&self) -> bool {
        CONTENT_FIELDS.iter().any(|f| self.contains(f))
    }

    /// Lowercased text of every string found anywhere in the record, keys included.
    ///
    /// Classification and context heuristics match against this.
    pub fn content_text(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.fields {
            push_text(&mut out, key);
            collect_strings(value, &mut out);
        }
        out.to_lowercase()
    }

    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.fields
    }

    pub fn into_map(self) -> Map<String, JsonValue> {
        self.fields
    }
}

impl From<Map<String, JsonValue>> for Record {
    fn from(fields: Map<String, JsonValue>) -> Self {
        Self { fields }
    }
}

impl From<Record> for JsonValue {
    fn from(record: Record) -> Self {
        JsonValue::Object(record.fields)
    }
}

fn push_text(out: &mut String, s: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(s);
}

fn collect_strings(value: &JsonValue, out: &mut String) {
    match value {
        JsonValue::String(s) => push_text(out, s),
        JsonValue::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        JsonValue::Object(map) => {
            for (k, v) in map {
                push_text(out, k);
                collect_strings(v, out);
            }
        }
        JsonValue::Number(n) => push_text(out, &n.to_string()),
        JsonValue::Bool(_) | JsonValue::Null => {}
    }
}

/// An ordered sequence of records, insertion order preserved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
