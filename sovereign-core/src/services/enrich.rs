//! Kenyan context enrichment and summaries

use serde_json::Value as JsonValue;

use crate::domain::{Record, RecordSet};

const KENYAN_INDICATORS: &[&str] = &["kenya", "nairobi", "mombasa", "county", "kes"];
const RELEVANCE_FIELDS: &[&str] = &["kenyan_relevance", "kenyan_relevance_score"];
const REGIONS: &[&str] = &["nairobi", "mombasa", "kisumu", "nakuru", "eldoret", "lamu"];
const TOPICS: &[&str] = &["development", "politics", "economy", "health", "education"];

/// Tag every record with its OSINT source type and verification indicators.
///
/// Existing fields are kept; the two added fields are overwritten if present.
pub fn enhance_with_osint_context(records: &RecordSet, source_type: &str) -> RecordSet {
    records
        .iter()
        .map(|record| {
            let indicators = verification_indicators(record);
            record
                .clone()
                .with("osint_source", source_type)
                .with("verification_indicators", indicators)
        })
        .collect()
}

fn verification_indicators(record: &Record) -> Vec<JsonValue> {
    let mut indicators = Vec::new();
    if record.contains("source") || record.contains("sources") {
        indicators.push("has_source");
    }
    if record.contains("timestamp") {
        indicators.push("has_timestamp");
    }
    if record.contains("url") {
        indicators.push("has_url");
    }
    if record
        .get("sources")
        .and_then(JsonValue::as_array)
        .map_or(false, |s| s.len() > 1)
    {
        indicators.push("multiple_sources");
    }
    if kenyan_relevance(record) > 0.0 {
        indicators.push("kenyan_context");
    }
    indicators.into_iter().map(JsonValue::from).collect()
}

/// Kenyan relevance of a record in [0, 1].
///
/// A declared numeric relevance wins; otherwise the share of Kenyan
/// indicators found in the record's text.
pub fn kenyan_relevance(record: &Record) -> f64 {
    if let Some(declared) = RELEVANCE_FIELDS.iter().find_map(|f| record.get_f64(f)) {
        return declared.clamp(0.0, 1.0);
    }
    let text = record.content_text();
    let hits = KENYAN_INDICATORS.iter().filter(|i| text.contains(*i)).count();
    hits as f64 / KENYAN_INDICATORS.len() as f64
}

/// Mean Kenyan relevance over a set, 0 for an empty set
pub fn overall_kenyan_relevance(records: &RecordSet) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(kenyan_relevance).sum::<f64>() / records.len() as f64
}

/// Which Kenyan communities a record touches
pub fn assess_kenyan_impact(record: &Record) -> Vec<&'static str> {
    let text = record.content_text();
    let mut impacts = Vec::new();
    if text.contains("nairobi") {
        impacts.push("Nairobi residents");
    }
    if text.contains("rural") || text.contains("county") {
        impacts.push("Rural communities");
    }
    if text.contains("youth") || text.contains("students") {
        impacts.push("Youth population");
    }
    if impacts.is_empty() {
        impacts.push("General Kenyan public");
    }
    impacts
}

/// One-line summary of the regions and topics a set covers
pub fn context_summary(records: &RecordSet) -> String {
    if records.is_empty() {
        return "No data available for context analysis".to_string();
    }

    let texts: Vec<String> = records.iter().map(Record::content_text).collect();
    let mentioned = |terms: &[&'static str]| -> Vec<&'static str> {
        terms
            .iter()
            .copied()
            .filter(|t| texts.iter().any(|text| text.contains(t)))
            .collect()
    };
    let regions = mentioned(REGIONS);
    let topics = mentioned(TOPICS);

    let mut summary = format!("Analysis of {} items:", records.len());
    if !regions.is_empty() {
        summary.push_str(&format!(" Regional focus: {}.", regions.join(", ")));
    }
    if !topics.is_empty() {
        summary.push_str(&format!(" Key topics: {}.", topics.join(", ")));
    }
    summary
}
