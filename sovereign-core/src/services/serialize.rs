//! Format serializer - renders templated records and parses them back
//!
//! JSON and CSV artifacts round-trip: `parse(serialize(records))` yields the
//! same records. HTML is for display only.
//!
//! CSV cell encoding:
//! - absent field → empty cell
//! - non-empty string that would not parse as JSON → the raw text
//! - anything else (numbers, booleans, null, lists, maps, and strings such as
//!   `"42"` or `""` that would be misread) → compact JSON

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use crate::domain::result::{Error, Result};
use crate::domain::{ExportFormat, Record, RecordSet, UserType};
use crate::services::template::{Template, TemplateSelector};

/// Version of the Kenyan context block in structured exports
pub const CONTEXT_VERSION: &str = "1.0";
/// Data protection regime exports are prepared under
pub const COMPLIANCE: &str = "DPA_2019";

/// Descriptive block written alongside the records
#[derive(Debug, Clone, Serialize)]
pub struct ExportMetadata {
    pub export_timestamp: DateTime<Utc>,
    pub user_type: UserType,
    pub region: String,
    pub language: String,
    pub kenyan_context_version: &'static str,
    pub data_protection_compliance: &'static str,
    pub record_count: usize,
    pub withheld_count: usize,
    #[serde(skip)]
    pub context_summary: String,
}

/// Render records in the given format
pub fn serialize(
    format: ExportFormat,
    template: &Template,
    records: &RecordSet,
    metadata: &ExportMetadata,
) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(template, records, metadata),
        ExportFormat::Csv => to_csv(template, records),
        ExportFormat::Html => Ok(to_html(template, records, metadata)),
    }
}

/// Parse a JSON or CSV artifact back into records
pub fn parse(format: ExportFormat, content: &str) -> Result<RecordSet> {
    match format {
        ExportFormat::Json => from_json(content),
        ExportFormat::Csv => from_csv(content),
        ExportFormat::Html => Err(Error::unsupported_format(
            "html exports are display-only and cannot be parsed",
        )),
    }
}

/// Whether an artifact is well formed for its format
pub fn is_well_formed(format: ExportFormat, content: &str) -> bool {
    match format {
        ExportFormat::Json | ExportFormat::Csv => parse(format, content).is_ok(),
        ExportFormat::Html => content.starts_with("<!DOCTYPE html>") && content.trim_end().ends_with("</html>"),
    }
}

// ============================================================================
// JSON
// ============================================================================

fn to_json(template: &Template, records: &RecordSet, metadata: &ExportMetadata) -> Result<String> {
    let layout = TemplateSelector::layout(template.user_type);
    let document = json!({
        "metadata": metadata,
        "export_template": {
            "format": layout.format,
            "sections": layout.sections,
            "kenyan_context": layout.kenyan_context,
            "fields": template.fields,
        },
        "data": records,
        "kenyan_context_summary": metadata.context_summary,
    });
    Ok(serde_json::to_string_pretty(&document)?)
}

fn from_json(content: &str) -> Result<RecordSet> {
    let mut document: JsonValue = serde_json::from_str(content)?;
    let data = document
        .get_mut("data")
        .map(JsonValue::take)
        .ok_or_else(|| Error::serialization("structured export has no 'data' section"))?;
    serde_json::from_value(data)
        .map_err(|e| Error::serialization(format!("malformed 'data' section: {}", e)))
}

// ============================================================================
// CSV
// ============================================================================

fn to_csv(template: &Template, records: &RecordSet) -> Result<String> {
    if template.fields.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(template.field_names())?;
    for record in records {
        let row: Vec<String> = template
            .field_names()
            .map(|name| record.get(name).map(encode_cell).unwrap_or_default())
            .collect();
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::serialization(e.to_string()))
}

fn from_csv(content: &str) -> Result<RecordSet> {
    if content.is_empty() {
        return Ok(RecordSet::default());
    }

    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader.headers()?.clone();

    let mut records = RecordSet::default();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (name, cell) in headers.iter().zip(row.iter()) {
            if let Some(value) = decode_cell(cell) {
                record.insert(name, value);
            }
        }
        records.push(record);
    }
    Ok(records)
}

fn encode_cell(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) if !s.is_empty() && serde_json::from_str::<JsonValue>(s).is_err() => {
            s.clone()
        }
        other => other.to_string(),
    }
}

fn decode_cell(cell: &str) -> Option<JsonValue> {
    if cell.is_empty() {
        return None;
    }
    Some(serde_json::from_str(cell).unwrap_or_else(|_| JsonValue::String(cell.to_string())))
}

// ============================================================================
// HTML
// ============================================================================

fn to_html(template: &Template, records: &RecordSet, metadata: &ExportMetadata) -> String {
    let mut items = String::new();
    for (index, record) in records.iter().enumerate() {
        let heading = record
            .get_str("title")
            .or_else(|| record.get_str("query"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Item {}", index + 1));

        items.push_str("<section class=\"data-item\">\n");
        items.push_str(&format!("<h3>{}</h3>\n<dl>\n", escape_html(&heading)));
        for field in &template.fields {
            if let Some(value) = record.get(field.name) {
                items.push_str(&format!(
                    "<dt>{}</dt><dd>{}</dd>\n",
                    escape_html(field.label),
                    html_value(value)
                ));
            }
        }
        items.push_str("</dl>\n</section>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<title>Sovereign OSINT Export - {user_type}</title>
<style>
body {{ font-family: Arial, sans-serif; margin: 40px; }}
.kenyan-context {{ background-color: #f0f8ff; padding: 15px; border-left: 4px solid #006400; }}
.data-item {{ border: 1px solid #ddd; margin: 10px 0; padding: 10px; }}
</style>
</head>
<body>
<h1>Sovereign OSINT Export</h1>
<p class="meta">Region: {region} &middot; Generated: {generated} &middot; Withheld: {withheld}</p>
<div class="kenyan-context">
<h3>Kenyan Context Preservation</h3>
<p>{summary}</p>
</div>
<h2>Data Items ({count})</h2>
{items}</body>
</html>
"#,
        lang = escape_html(&metadata.language),
        user_type = escape_html(&title_case(metadata.user_type.as_str())),
        region = escape_html(&metadata.region),
        generated = metadata.export_timestamp.format("%Y-%m-%d %H:%M:%S"),
        withheld = metadata.withheld_count,
        summary = escape_html(&metadata.context_summary),
        count = records.len(),
        items = items,
    )
}

fn html_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => escape_html(s),
        JsonValue::Array(items) if items.iter().all(JsonValue::is_string) => {
            let list: String = items
                .iter()
                .filter_map(JsonValue::as_str)
                .map(|s| format!("<li>{}</li>", escape_html(s)))
                .collect();
            format!("<ul>{}</ul>", list)
        }
        other => format!("<code>{}</code>", escape_html(&other.to_string())),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
