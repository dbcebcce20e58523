//! Batch command - export records across formats and user types

use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::Colorize;
use sovereign_core::{BatchReport, OperationResult};

use super::{get_context, read_input};
use crate::output;

fn report_json(report: &BatchReport) -> serde_json::Value {
    let results: Vec<_> = report
        .results
        .iter()
        .map(|r| {
            serde_json::json!({
                "format": r.format,
                "user_type": r.user_type,
                "filename": r.filename,
                "path": r.path,
                "size_bytes": r.size_bytes,
                "record_count": r.record_count,
                "withheld_count": r.withheld_count,
                "empty_count": r.empty_count,
                "quality": r.quality,
            })
        })
        .collect();
    serde_json::json!({
        "results": results,
        "failures": report.failures,
        "overall_quality": report.overall_quality,
        "input_normalized": report.input_normalized,
    })
}

pub fn run(
    file: Option<&Path>,
    formats: &[String],
    user_types: &[String],
    government_permission: bool,
    output_dir: Option<PathBuf>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let input = read_input(file)?;
    let ctx = get_context("batch")?;

    let formats: Vec<&str> = formats.iter().map(|s| s.trim()).collect();
    let user_types: Vec<&str> = user_types.iter().map(|s| s.trim()).collect();

    let outcome = if dry_run {
        ctx.export_service
            .batch_export(input, &formats, &user_types, government_permission)
    } else {
        let dir = output_dir.unwrap_or_else(|| ctx.config.output_dir.clone());
        ctx.export_service.batch_export_to_dir(
            input,
            &formats,
            &user_types,
            government_permission,
            &dir,
        )
    };

    if json {
        let relay = match &outcome {
            Ok(report) => OperationResult::ok(report_json(report)),
            Err(e) => OperationResult::from_error(e),
        };
        println!("{}", serde_json::to_string_pretty(&relay)?);
        return outcome.map(|_| ()).map_err(Into::into);
    }
    let report = outcome?;

    let mut table = output::create_table();
    table.set_header(vec!["Format", "User type", "Records", "Withheld", "Quality", "File"]);
    for r in &report.results {
        table.add_row(vec![
            r.format.to_string(),
            r.user_type.to_string(),
            r.record_count.to_string(),
            r.withheld_count.to_string(),
            output::format_quality(r.quality_score()),
            if dry_run { "-".to_string() } else { r.filename.clone() },
        ]);
    }
    if !report.results.is_empty() {
        println!("{}", table);
    }

    if !report.failures.is_empty() {
        println!();
        println!("{}", "Failed combinations:".red().bold());
        for f in &report.failures {
            println!(
                "  {} / {} [{} at {}]: {}",
                f.format, f.user_type, f.kind, f.stage, f.error
            );
        }
    }

    println!();
    let summary = format!(
        "{} of {} exports succeeded, overall quality {:.2}",
        report.results.len(),
        report.total(),
        report.overall_quality
    );
    if report.is_complete_success() {
        output::success(&summary);
    } else {
        output::warning(&summary);
    }

    Ok(())
}
