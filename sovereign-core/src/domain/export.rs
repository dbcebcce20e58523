//! Export domain model: formats, pipeline stages, results and batch reports

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::Error;
use super::user_type::UserType;

/// Output format of an export artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Structured text, parseable back into records
    Json,
    /// Tabular text, parseable back into records
    Csv,
    /// Markup, display only
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Json, ExportFormat::Csv, ExportFormat::Html];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Html => "html",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" | "structured" => Ok(ExportFormat::Json),
            "csv" | "tabular" => Ok(ExportFormat::Csv),
            "html" | "markup" => Ok(ExportFormat::Html),
            other => Err(Error::unsupported_format(format!("'{}'", other))),
        }
    }
}

/// Where a single export is in its linear pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStage {
    Received,
    Normalized,
    Classified,
    Templated,
    Serialized,
    Done,
}

impl ExportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStage::Received => "received",
            ExportStage::Normalized => "normalized",
            ExportStage::Classified => "classified",
            ExportStage::Templated => "templated",
            ExportStage::Serialized => "serialized",
            ExportStage::Done => "done",
        }
    }

    /// The stage that follows this one, `None` once done
    pub fn next(&self) -> Option<ExportStage> {
        match self {
            ExportStage::Received => Some(ExportStage::Normalized),
            ExportStage::Normalized => Some(ExportStage::Classified),
            ExportStage::Classified => Some(ExportStage::Templated),
            ExportStage::Templated => Some(ExportStage::Serialized),
            ExportStage::Serialized => Some(ExportStage::Done),
            ExportStage::Done => None,
        }
    }
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to export: audience, format and whether government access is granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub user_type: UserType,
    pub format: ExportFormat,
    pub government_permission: bool,
}

impl ExportRequest {
    pub fn new(user_type: UserType, format: ExportFormat, government_permission: bool) -> Self {
        Self {
            user_type,
            format,
            government_permission,
        }
    }

    /// Build a request from caller-supplied names
    pub fn parse(user_type: &str, format: &str, government_permission: bool) -> Result<Self, Error> {
        Ok(Self::new(user_type.parse()?, format.parse()?, government_permission))
    }
}

/// Quality of a single export, each component in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Emitted records / input records
    pub coverage: f64,
    /// Mean share of each emitted record's fields that survived templating
    pub completeness: f64,
    /// Mean Kenyan relevance of emitted records
    pub context: f64,
    /// 1.0 when the artifact is well formed
    pub validity: f64,
    /// Weighted mean of the components
    pub overall: f64,
}

/// Output of one export call. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    pub id: Uuid,
    pub format: ExportFormat,
    pub user_type: UserType,
    pub content: String,
    pub filename: String,
    /// Set once the artifact has been written to disk
    pub path: Option<PathBuf>,
    pub size_bytes: u64,
    /// True when the input was a single record wrapped into a set
    pub input_normalized: bool,
    pub quality: QualityScore,
    pub record_count: usize,
    pub withheld_count: usize,
    /// Records left out because none of their fields is on the template
    pub empty_count: usize,
    pub created_at: DateTime<Utc>,
}

impl ExportResult {
    pub fn quality_score(&self) -> f64 {
        self.quality.overall
    }
}

/// One failed combination inside a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    pub format: String,
    pub user_type: String,
    /// Last stage reached before failing
    pub stage: ExportStage,
    pub kind: String,
    pub error: String,
}

/// Aggregate of a batch export: every combination is either a result or a failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<ExportResult>,
    pub failures: Vec<BatchFailure>,
    pub overall_quality: f64,
    pub input_normalized: bool,
    pub created_at: DateTime<Utc>,
}

impl BatchReport {
    /// Build a report, computing the overall quality as the mean of successes
    pub fn new(results: Vec<ExportResult>, failures: Vec<BatchFailure>, input_normalized: bool) -> Self {
        let overall_quality = if results.is_empty() {
            0.0
        } else {
            results.iter().map(ExportResult::quality_score).sum::<f64>() / results.len() as f64
        };

        Self {
            results,
            failures,
            overall_quality,
            input_normalized,
            created_at: Utc::now(),
        }
    }

    /// Number of combinations covered (successes + failures)
    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_aliases() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("tabular".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("markup".parse::<ExportFormat>().unwrap(), ExportFormat::Html);
    }

    #[test]
    fn test_unknown_format() {
        let err = "pdf".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_request_from_names() {
        let request = ExportRequest::parse("NGO", "structured", false).unwrap();
        assert_eq!(request, ExportRequest::new(UserType::Ngo, ExportFormat::Json, false));
        assert!(matches!(
            ExportRequest::parse("citizen", "json", false).unwrap_err(),
            Error::InvalidInputKind(_)
        ));
    }

    #[test]
    fn test_stage_sequence_is_linear() {
        let mut stage = ExportStage::Received;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            stage = next;
            seen.push(stage);
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(stage, ExportStage::Done);
    }

    #[test]
    fn test_empty_batch_report_quality_is_zero() {
        let failure = BatchFailure {
            format: "pdf".to_string(),
            user_type: "ngo".to_string(),
            stage: ExportStage::Received,
            kind: "unsupported_format".to_string(),
            error: "Unsupported format: 'pdf'".to_string(),
        };
        let report = BatchReport::new(vec![], vec![failure], false);
        assert_eq!(report.overall_quality, 0.0);
        assert_eq!(report.total(), 1);
        assert!(!report.is_complete_success());
    }
}
