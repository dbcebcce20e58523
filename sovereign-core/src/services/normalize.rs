//! Record normalizer - one uniform record set shape for the pipeline

use serde_json::Value as JsonValue;

use crate::domain::result::{Error, Result};
use crate::domain::{Record, RecordSet};

/// A record set plus whether it was produced by wrapping a single record
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub records: RecordSet,
    pub input_normalized: bool,
}

impl Normalized {
    /// Wrap a single record into a one-element set
    pub fn from_record(record: Record) -> Self {
        Self {
            records: RecordSet::new(vec![record]),
            input_normalized: true,
        }
    }

    /// Pass a record collection through unchanged
    pub fn from_records(records: RecordSet) -> Self {
        Self {
            records,
            input_normalized: false,
        }
    }
}

/// Normalize raw collector output
///
/// An object becomes a one-element set; an array of objects passes through.
/// Anything else fails with `InvalidInputKind`.
pub fn normalize(input: JsonValue) -> Result<Normalized> {
    match input {
        JsonValue::Object(map) => Ok(Normalized::from_record(Record::from(map))),
        JsonValue::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    JsonValue::Object(map) => records.push(Record::from(map)),
                    other => {
                        return Err(Error::invalid_input(format!(
                            "element {} is {}, expected a record",
                            index,
                            kind_name(&other)
                        )))
                    }
                }
            }
            Ok(Normalized::from_records(RecordSet::new(records)))
        }
        other => Err(Error::invalid_input(format!(
            "got {}, expected a record or a list of records",
            kind_name(&other)
        ))),
    }
}

fn kind_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a list",
        JsonValue::Object(_) => "a record",
    }
}
