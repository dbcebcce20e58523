//! Collect command - gather records from the offline collector

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use sovereign_core::adapters::collector_for;
use sovereign_core::config::CollectorMode;
use sovereign_core::services::enrich::overall_kenyan_relevance;
use sovereign_core::services::{
    assess_kenyan_impact, context_summary, enhance_with_osint_context, kenyan_relevance,
};

use super::get_context;

pub fn run(query: &str, collector: Option<&str>, source_type: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context("collect")?;

    let override_collector = match collector {
        Some(name) => Some(collector_for(name.parse::<CollectorMode>()?)),
        None => None,
    };
    let collector = override_collector.as_deref().unwrap_or(ctx.collector.as_ref());

    let mut records = collector.collect(query)?;
    if let Some(source_type) = source_type {
        records = enhance_with_osint_context(&records, source_type);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No records found for '{}'.", query);
        return Ok(());
    }

    println!(
        "{} ({} collector)",
        format!("{} record(s)", records.len()).bold(),
        collector.name()
    );

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Title", "Source", "Relevance", "Impacted"]);
    for record in &records {
        table.add_row(vec![
            record.get_str("title").unwrap_or("-").to_string(),
            record.get_str("source").unwrap_or("-").to_string(),
            format!("{:.2}", kenyan_relevance(record)),
            assess_kenyan_impact(record).join(", "),
        ]);
    }
    println!("{}", table);
    println!();
    println!("{}", context_summary(&records).dimmed());
    println!(
        "Overall Kenyan relevance: {:.2}",
        overall_kenyan_relevance(&records)
    );

    Ok(())
}
