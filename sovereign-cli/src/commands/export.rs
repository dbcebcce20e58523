//! Export command - export records for one user type in one format

use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use sovereign_core::{ExportResult, OperationResult, QualityScore};

use super::{get_context, read_input};
use crate::output;

#[derive(Serialize)]
struct ExportOutput<'a> {
    id: String,
    filename: &'a str,
    path: Option<String>,
    format: &'a str,
    user_type: &'a str,
    size_bytes: u64,
    input_normalized: bool,
    record_count: usize,
    withheld_count: usize,
    empty_count: usize,
    quality: QualityScore,
}

impl<'a> From<&'a ExportResult> for ExportOutput<'a> {
    fn from(result: &'a ExportResult) -> Self {
        Self {
            id: result.id.to_string(),
            filename: &result.filename,
            path: result.path.as_ref().map(|p| p.display().to_string()),
            format: result.format.as_str(),
            user_type: result.user_type.as_str(),
            size_bytes: result.size_bytes,
            input_normalized: result.input_normalized,
            record_count: result.record_count,
            withheld_count: result.withheld_count,
            empty_count: result.empty_count,
            quality: result.quality,
        }
    }
}

pub fn run(
    file: Option<&Path>,
    user_type: &str,
    format: &str,
    government_permission: bool,
    output_dir: Option<PathBuf>,
    stdout: bool,
    json: bool,
) -> Result<()> {
    let input = read_input(file)?;
    let ctx = get_context("export")?;
    let service = &ctx.export_service;

    if stdout {
        let result = service.export_data(input, user_type, format, government_permission)?;
        print!("{}", result.content);
        return Ok(());
    }

    let dir = output_dir.unwrap_or_else(|| ctx.config.output_dir.clone());
    let outcome = service.export_to_dir(input, user_type, format, government_permission, &dir);

    if json {
        let relay = match &outcome {
            Ok(result) => OperationResult::ok(ExportOutput::from(result)),
            Err(e) => OperationResult::from_error(e),
        };
        println!("{}", serde_json::to_string_pretty(&relay)?);
        return outcome.map(|_| ()).map_err(Into::into);
    }
    let result = outcome?;

    output::success(&format!("Exported {} record(s)", result.record_count));
    if let Some(path) = &result.path {
        println!("File: {}", path.display());
    }
    println!(
        "Format: {}  User type: {}  Size: {}",
        result.format,
        result.user_type,
        output::format_size(result.size_bytes)
    );
    println!("Quality: {}", output::format_quality(result.quality_score()));
    if result.input_normalized {
        println!("{}", "Single record wrapped into a list".dimmed());
    }
    if result.withheld_count > 0 {
        output::warning(&format!(
            "{} restricted record(s) withheld",
            result.withheld_count
        ));
    }
    if result.empty_count > 0 {
        output::warning(&format!(
            "{} record(s) had no exportable fields for {}",
            result.empty_count, result.user_type
        ));
    }

    Ok(())
}
