//! Export service - runs the export pipeline for single and batch exports
//!
//! A single export passes Received → Normalized → Classified → Templated →
//! Serialized → Done. The first fatal error ends it with no artifact. A batch
//! export normalizes once and runs every (format, user type) combination on
//! its own scoped thread, recording failures instead of returning them.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::{
    BatchFailure, BatchReport, ExportFormat, ExportRequest, ExportResult, ExportStage, Record,
    RecordSet, SensitivityLevel, UserType,
};
use crate::services::anonymize::Anonymizer;
use crate::services::classify::SensitivityClassifier;
use crate::services::enrich::context_summary;
use crate::services::logging::{LogEvent, LoggingService};
use crate::services::normalize::{normalize, Normalized};
use crate::services::quality::{assess, QualityInput};
use crate::services::serialize::{
    is_well_formed, serialize, ExportMetadata, COMPLIANCE, CONTEXT_VERSION,
};
use crate::services::template::TemplateSelector;

/// A failed export together with the last stage it reached
struct StageError {
    stage: ExportStage,
    error: Error,
}

impl StageError {
    fn at(stage: ExportStage) -> impl FnOnce(Error) -> StageError {
        move |error| StageError { stage, error }
    }
}

/// Service for exporting record sets
pub struct ExportService {
    config: Config,
    logger: Option<Arc<LoggingService>>,
    classifier: SensitivityClassifier,
    anonymizer: Anonymizer,
}

impl ExportService {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            logger: None,
            classifier: SensitivityClassifier::new(),
            anonymizer: Anonymizer::new(),
        }
    }

    /// Attach an event log. Without one, events are dropped.
    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Export a record or list of records for one user type in one format
    ///
    /// `government_permission` is combined with the configured
    /// `government_export_permitted` flag; either one grants it.
    pub fn export_data(
        &self,
        input: JsonValue,
        user_type: &str,
        format: &str,
        government_permission: bool,
    ) -> Result<ExportResult> {
        let outcome = self
            .parse_request(user_type, format, government_permission)
            .and_then(|request| {
                let normalized = normalize(input).map_err(StageError::at(ExportStage::Received))?;
                self.run(&normalized, &request)
            });

        match outcome {
            Ok(result) => Ok(result),
            Err(failure) => {
                self.log_failure(user_type, format, &failure);
                Err(failure.error)
            }
        }
    }

    /// Export already-normalized records for a typed request
    pub fn export_records(
        &self,
        normalized: &Normalized,
        request: &ExportRequest,
    ) -> Result<ExportResult> {
        self.authorize(request)
            .map_err(StageError::at(ExportStage::Normalized))
            .and_then(|_| self.run(normalized, request))
            .map_err(|failure| {
                self.log_failure(request.user_type.as_str(), request.format.as_str(), &failure);
                failure.error
            })
    }

    /// Export and write the artifact into `dir`
    ///
    /// The file only appears once it is complete. On any error nothing is written.
    pub fn export_to_dir(
        &self,
        input: JsonValue,
        user_type: &str,
        format: &str,
        government_permission: bool,
        dir: &Path,
    ) -> Result<ExportResult> {
        let mut result = self.export_data(input, user_type, format, government_permission)?;
        write_artifact(dir, &mut result)?;
        Ok(result)
    }

    /// Export one record set across every (format, user type) combination
    ///
    /// Only an invalid input shape fails the call. Every combination yields
    /// either a result or a recorded failure, in format-major order.
    pub fn batch_export(
        &self,
        input: JsonValue,
        formats: &[&str],
        user_types: &[&str],
        government_permission: bool,
    ) -> Result<BatchReport> {
        let normalized = normalize(input)?;

        let combinations: Vec<(&str, &str)> = formats
            .iter()
            .flat_map(|f| user_types.iter().map(move |u| (*f, *u)))
            .collect();

        let outcomes: Vec<std::result::Result<ExportResult, BatchFailure>> = thread::scope(|scope| {
            let handles: Vec<_> = combinations
                .iter()
                .map(|&(format, user_type)| {
                    let records = normalized.clone();
                    scope.spawn(move || {
                        self.run_combination(&records, user_type, format, government_permission)
                    })
                })
                .collect();

            handles
                .into_iter()
                .zip(combinations.iter())
                .map(|(handle, &(format, user_type))| {
                    handle.join().unwrap_or_else(|_| {
                        Err(BatchFailure {
                            format: format.to_string(),
                            user_type: user_type.to_string(),
                            stage: ExportStage::Normalized,
                            kind: "other".to_string(),
                            error: "export worker panicked".to_string(),
                        })
                    })
                })
                .collect()
        });

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(failure) => failures.push(failure),
            }
        }

        let report = BatchReport::new(results, failures, normalized.input_normalized);
        self.log(
            LogEvent::new("batch_completed").with_error_details(format!(
                "results={} failures={} overall_quality={:.3}",
                report.results.len(),
                report.failures.len(),
                report.overall_quality
            )),
        );
        Ok(report)
    }

    /// Batch export, writing every successful artifact into `dir`
    ///
    /// A combination whose write fails moves from `results` to `failures`.
    pub fn batch_export_to_dir(
        &self,
        input: JsonValue,
        formats: &[&str],
        user_types: &[&str],
        government_permission: bool,
        dir: &Path,
    ) -> Result<BatchReport> {
        let report = self.batch_export(input, formats, user_types, government_permission)?;

        let mut results = Vec::with_capacity(report.results.len());
        let mut failures = report.failures;
        for mut result in report.results {
            match write_artifact(dir, &mut result) {
                Ok(()) => results.push(result),
                Err(e) => failures.push(BatchFailure {
                    format: result.format.to_string(),
                    user_type: result.user_type.to_string(),
                    stage: ExportStage::Done,
                    kind: e.kind().to_string(),
                    error: e.to_string(),
                }),
            }
        }

        Ok(BatchReport::new(results, failures, report.input_normalized))
    }

    fn run_combination(
        &self,
        normalized: &Normalized,
        user_type: &str,
        format: &str,
        government_permission: bool,
    ) -> std::result::Result<ExportResult, BatchFailure> {
        self.parse_request(user_type, format, government_permission)
            .map_err(|f| StageError { stage: ExportStage::Normalized, error: f.error })
            .and_then(|request| self.run(normalized, &request))
            .map_err(|failure| {
                self.log_failure(user_type, format, &failure);
                BatchFailure {
                    format: format.to_string(),
                    user_type: user_type.to_string(),
                    stage: failure.stage,
                    kind: failure.error.kind().to_string(),
                    error: failure.error.to_string(),
                }
            })
    }

    /// Parse the caller-supplied names and check authorization
    fn parse_request(
        &self,
        user_type: &str,
        format: &str,
        government_permission: bool,
    ) -> std::result::Result<ExportRequest, StageError> {
        ExportRequest::parse(user_type, format, government_permission)
            .and_then(|request| self.authorize(&request).map(|_| request))
            .map_err(StageError::at(ExportStage::Received))
    }

    fn authorize(&self, request: &ExportRequest) -> Result<()> {
        TemplateSelector::authorize(request.user_type, self.permitted(request))
    }

    fn permitted(&self, request: &ExportRequest) -> bool {
        request.government_permission || self.config.government_export_permitted
    }

    /// The pipeline from normalized records to a finished artifact
    fn run(
        &self,
        normalized: &Normalized,
        request: &ExportRequest,
    ) -> std::result::Result<ExportResult, StageError> {
        let ExportRequest { user_type, format, .. } = *request;
        let source = &normalized.records;
        let include_restricted = user_type == UserType::Government && self.permitted(request);
        let anonymize_sensitive =
            self.config.enforce_ethical_boundaries && user_type != UserType::Government;

        // Classified: decide per record whether it is emitted, and in what form
        let mut kept: Vec<(Record, &Record)> = Vec::with_capacity(source.len());
        let mut withheld_count = 0;
        for record in source {
            let classification = self.classifier.classify(record, user_type);
            if let Some(ambiguity) = &classification.ambiguity {
                self.log(
                    LogEvent::new("classification_ambiguous")
                        .with_user_type(user_type.as_str())
                        .with_format(format.as_str())
                        .with_error_details(format!("resolved_to={}", ambiguity.resolved_to)),
                );
            }

            match classification.level {
                SensitivityLevel::Restricted if !include_restricted => withheld_count += 1,
                SensitivityLevel::Sensitive if anonymize_sensitive => {
                    kept.push((self.anonymizer.anonymize(record), record))
                }
                _ => kept.push((record.clone(), record)),
            }
        }

        // Templated: project every record onto the set-level template. A record
        // with nothing left after projection is not emitted in any format.
        let prepared: RecordSet = kept.iter().map(|(r, _)| r.clone()).collect();
        let template = TemplateSelector::select_for_set(user_type, &prepared);
        let mut empty_count = 0;
        let emitted: Vec<(Record, &Record)> = kept
            .iter()
            .filter_map(|(prepared, original)| {
                let projected = template.apply(prepared);
                if projected.is_empty() {
                    empty_count += 1;
                    None
                } else {
                    Some((projected, *original))
                }
            })
            .collect();
        let emitted_set: RecordSet = emitted.iter().map(|(r, _)| r.clone()).collect();

        // Serialized
        let created_at = Utc::now();
        let metadata = ExportMetadata {
            export_timestamp: created_at,
            user_type,
            region: self.config.default_region.clone(),
            language: self.config.default_language.clone(),
            kenyan_context_version: CONTEXT_VERSION,
            data_protection_compliance: COMPLIANCE,
            record_count: emitted_set.len(),
            withheld_count,
            context_summary: context_summary(&emitted_set),
        };
        let content = serialize(format, &template, &emitted_set, &metadata)
            .map_err(StageError::at(ExportStage::Templated))?;

        let quality = assess(
            &QualityInput {
                input: source,
                emitted: &emitted,
                valid: is_well_formed(format, &content),
            },
            &self.config.quality_weights,
        );

        let id = Uuid::new_v4();
        let result = ExportResult {
            id,
            format,
            user_type,
            filename: export_filename(user_type, format, &id, created_at),
            path: None,
            size_bytes: content.len() as u64,
            content,
            input_normalized: normalized.input_normalized,
            quality,
            record_count: emitted_set.len(),
            withheld_count,
            empty_count,
            created_at,
        };

        self.log(
            LogEvent::new("export_completed")
                .with_user_type(user_type.as_str())
                .with_format(format.as_str()),
        );
        Ok(result)
    }

    fn log_failure(&self, user_type: &str, format: &str, failure: &StageError) {
        self.log(
            LogEvent::new("export_failed")
                .with_user_type(user_type)
                .with_format(format)
                .with_error(failure.error.to_string())
                .with_error_details(format!(
                    "stage={} kind={}",
                    failure.stage,
                    failure.error.kind()
                )),
        );
    }

    /// Logging never fails an export
    fn log(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            let _ = logger.log(event);
        }
    }
}

/// `sovereign_export_{user_type}_{YYYYmmdd_HHMMSS}_{id8}.{ext}`
fn export_filename(
    user_type: UserType,
    format: ExportFormat,
    id: &Uuid,
    created_at: chrono::DateTime<Utc>,
) -> String {
    let id = id.simple().to_string();
    format!(
        "sovereign_export_{}_{}_{}.{}",
        user_type,
        created_at.format("%Y%m%d_%H%M%S"),
        &id[..8],
        format.extension()
    )
}

/// Write an artifact atomically and record its path on the result
fn write_artifact(dir: &Path, result: &mut ExportResult) -> Result<()> {
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(result.content.as_bytes())?;
    file.flush()?;

    let path = dir.join(&result.filename);
    file.persist(&path).map_err(|e| Error::Io(e.error))?;

    result.path = Some(path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::logging::{EntryPoint, LogFilter};
    use crate::services::serialize::parse;
    use serde_json::json;
    use tempfile::tempdir;

    fn service() -> ExportService {
        ExportService::new(Config::default())
    }

    #[test]
    fn test_single_record_is_normalized() {
        let result = service()
            .export_data(json!({"query": "Nairobi roads", "results": []}), "journalist", "json", false)
            .unwrap();

        assert!(result.input_normalized);
        assert!(result.content.contains("\"query\": \"Nairobi roads\""));
        assert_eq!(result.record_count, 1);
        assert!(result.filename.starts_with("sovereign_export_journalist_"));
        assert!(result.filename.ends_with(".json"));
        assert_eq!(result.size_bytes, result.content.len() as u64);
    }

    #[test]
    fn test_format_alias() {
        let result = service()
            .export_data(json!([{"title": "Budget"}]), "Researcher", "tabular", false)
            .unwrap();
        assert_eq!(result.format, ExportFormat::Csv);
        assert!(!result.input_normalized);
        assert_eq!(result.content.lines().next(), Some("title"));
    }

    #[test]
    fn test_government_requires_permission() {
        let err = service()
            .export_data(json!({"query": "Nairobi roads"}), "government", "json", false)
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[test]
    fn test_configured_permission_grants_government() {
        let config = Config {
            government_export_permitted: true,
            ..Config::default()
        };
        let result = ExportService::new(config)
            .export_data(json!({"query": "Nairobi roads"}), "government", "json", false)
            .unwrap();
        assert_eq!(result.user_type, UserType::Government);
    }

    #[test]
    fn test_unknown_names_fail() {
        let svc = service();
        assert!(matches!(
            svc.export_data(json!({"query": "a"}), "lobbyist", "json", false).unwrap_err(),
            Error::InvalidInputKind(_)
        ));
        assert!(matches!(
            svc.export_data(json!({"query": "a"}), "ngo", "pdf", false).unwrap_err(),
            Error::UnsupportedFormat(_)
        ));
        assert!(matches!(
            svc.export_data(json!(42), "ngo", "json", false).unwrap_err(),
            Error::InvalidInputKind(_)
        ));
    }

    #[test]
    fn test_restricted_records_withheld() {
        let input = json!([
            {"title": "Roads", "content": "Nairobi roads budget"},
            {"title": "Memo", "content": "leaked intelligence report", "data_sensitivity": "classified"}
        ]);
        let result = service().export_data(input, "journalist", "json", false).unwrap();

        assert_eq!(result.record_count, 1);
        assert_eq!(result.withheld_count, 1);
        assert!(!result.content.contains("intelligence report"));
    }

    #[test]
    fn test_government_with_permission_sees_restricted() {
        let input = json!([{"title": "Memo", "content": "intelligence report", "data_sensitivity": "restricted"}]);
        let result = service().export_data(input, "government", "json", true).unwrap();
        assert_eq!(result.withheld_count, 0);
        assert!(result.content.contains("intelligence report"));
    }

    #[test]
    fn test_sensitive_records_anonymized() {
        let input = json!({
            "title": "Tip",
            "content": "Call the source on 0712345678",
            "phone_number": "0712345678"
        });
        let result = service().export_data(input, "journalist", "csv", false).unwrap();
        assert!(!result.content.contains("0712345678"));
        assert!(result.content.contains("[REDACTED:phone:sha"));
    }

    #[test]
    fn test_nested_identifiers_anonymized() {
        let input = json!({
            "content": "Household survey",
            "results": [
                {"respondent_id": 23456789, "ward": "Makina"},
                {"phone_number": "0712 345 678", "ward": "Kibera"}
            ]
        });
        for format in ["json", "csv"] {
            let result = service().export_data(input.clone(), "researcher", format, false).unwrap();
            assert_eq!(result.record_count, 1);
            assert!(!result.content.contains("23456789"), "{}", format);
            assert!(!result.content.contains("0712 345 678"), "{}", format);
            assert!(!result.content.contains("phone_number"), "{}", format);
            assert!(result.content.contains("[REDACTED:national_id:sha"), "{}", format);
            assert!(result.content.contains("Kibera"), "{}", format);
        }
    }

    #[test]
    fn test_anonymization_off_keeps_text() {
        let config = Config {
            enforce_ethical_boundaries: false,
            ..Config::default()
        };
        let input = json!({"title": "Tip", "content": "Call 0712345678"});
        let result = ExportService::new(config)
            .export_data(input, "journalist", "json", false)
            .unwrap();
        assert!(result.content.contains("0712345678"));
    }

    #[test]
    fn test_quality_in_range() {
        let result = service()
            .export_data(json!({"title": "Nairobi county budget"}), "ngo", "html", false)
            .unwrap();
        assert!(result.quality_score() > 0.0 && result.quality_score() <= 1.0);
        assert_eq!(result.quality.validity, 1.0);
    }

    #[test]
    fn test_batch_records_failures_per_combination() {
        let report = service()
            .batch_export(
                json!([{"query": "a"}]),
                &["json", "pdf"],
                &["ngo", "government"],
                false,
            )
            .unwrap();

        assert_eq!(report.total(), 4);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.failures.len(), 3);

        let kinds: Vec<&str> = report.failures.iter().map(|f| f.kind.as_str()).collect();
        assert_eq!(kinds, vec!["permission_denied", "unsupported_format", "unsupported_format"]);
        assert!(report.failures.iter().all(|f| f.stage == ExportStage::Normalized));
    }

    #[test]
    fn test_batch_invalid_input_fails_call() {
        let err = service()
            .batch_export(json!("not records"), &["json"], &["ngo"], false)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInputKind(_)));
    }

    #[test]
    fn test_export_records_with_typed_request() {
        let normalized = Normalized::from_record(
            Record::new().with("title", "Flood response").with("source", "Daily Nation"),
        );
        let service = service();

        let request = ExportRequest::new(UserType::Ngo, ExportFormat::Json, false);
        let result = service.export_records(&normalized, &request).unwrap();
        assert!(result.input_normalized);
        assert_eq!(result.user_type, UserType::Ngo);

        let request = ExportRequest::new(UserType::Government, ExportFormat::Csv, false);
        let err = service.export_records(&normalized, &request).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[test]
    fn test_export_to_dir_writes_file() {
        let dir = tempdir().unwrap();
        let result = service()
            .export_to_dir(json!({"title": "Roads"}), "developer", "json", false, dir.path())
            .unwrap();

        let path = result.path.clone().unwrap();
        assert_eq!(path, dir.path().join(&result.filename));
        let written = fs::read_to_string(path).unwrap();
        assert_eq!(written, result.content);
        assert_eq!(parse(ExportFormat::Json, &written).unwrap().len(), 1);
    }

    #[test]
    fn test_batch_write_failure_moves_result_to_failures() {
        let dir = tempdir().unwrap();
        let occupied = dir.path().join("exports");
        fs::write(&occupied, "not a directory").unwrap();

        let report = service()
            .batch_export_to_dir(
                json!([{"title": "Roads"}]),
                &["json", "csv"],
                &["ngo"],
                false,
                &occupied,
            )
            .unwrap();

        assert!(report.results.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.overall_quality, 0.0);
        for failure in &report.failures {
            assert_eq!(failure.stage, ExportStage::Done);
            assert_eq!(failure.kind, "io");
            assert_eq!(failure.user_type, "ngo");
        }
        let formats: Vec<&str> = report.failures.iter().map(|f| f.format.as_str()).collect();
        assert_eq!(formats, vec!["json", "csv"]);
        assert_eq!(fs::read_to_string(&occupied).unwrap(), "not a directory");
    }

    #[test]
    fn test_events_logged() {
        let dir = tempdir().unwrap();
        let logger = Arc::new(LoggingService::new(dir.path(), EntryPoint::Library, "test").unwrap());
        let svc = service().with_logger(Arc::clone(&logger));

        svc.export_data(json!({"title": "Roads"}), "ngo", "json", false).unwrap();
        let _ = svc.export_data(json!({"title": "Roads"}), "government", "json", false);
        svc.export_data(json!({"url": "https://example.org"}), "ngo", "json", false).unwrap();

        let events: Vec<String> = logger
            .entries(&LogFilter::recent(10))
            .unwrap()
            .into_iter()
            .rev()
            .map(|e| e.event)
            .collect();
        assert_eq!(
            events,
            vec![
                "export_completed",
                "export_failed",
                "classification_ambiguous",
                "export_completed"
            ]
        );
        let errors = logger.entries(&LogFilter::errors(10)).unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].error_details.as_deref().unwrap().contains("permission_denied"));
    }
}
