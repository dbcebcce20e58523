//! Config command - view and change settings

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use sovereign_core::config::{Config, Setting};

use super::{get_sovereign_dir, log_event, get_logger};
use crate::output;
use sovereign_core::LogEvent;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a setting
    Set {
        /// Setting name (region, language, enforce-ethics, government-permission, collector, output-dir)
        key: String,
        /// New value
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn config_json(config: &Config) -> serde_json::Value {
    serde_json::json!({
        "default_region": config.default_region,
        "default_language": config.default_language,
        "enforce_ethical_boundaries": config.enforce_ethical_boundaries,
        "government_export_permitted": config.government_export_permitted,
        "collector": config.collector.as_str(),
        "output_dir": config.output_dir.display().to_string(),
        "quality_weights": config.quality_weights,
    })
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let sovereign_dir = get_sovereign_dir()?;
    std::fs::create_dir_all(&sovereign_dir)
        .with_context(|| format!("Failed to create sovereign directory: {:?}", sovereign_dir))?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&sovereign_dir)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&config_json(&config))?);
                return Ok(());
            }

            let mut table = output::create_table();
            table.add_row(vec!["Region", config.default_region.as_str()]);
            table.add_row(vec!["Language", config.default_language.as_str()]);
            table.add_row(vec![
                "Ethical boundaries",
                if config.enforce_ethical_boundaries { "enforced" } else { "off" },
            ]);
            table.add_row(vec![
                "Government exports",
                if config.government_export_permitted { "permitted" } else { "need --government-permission" },
            ]);
            table.add_row(vec!["Collector", config.collector.as_str()]);
            let output_dir = config.output_dir.display().to_string();
            table.add_row(vec!["Output dir", output_dir.as_str()]);

            println!("{}", "Sovereign Settings".bold());
            println!("{}", table);
            println!(
                "{}",
                format!("Settings file: {}", sovereign_dir.join("settings.json").display()).dimmed()
            );
        }
        ConfigCommands::Set { key, value, json } => {
            let setting = Setting::parse(&key, &value)?;
            Config::set(&sovereign_dir, setting)?;
            log_event(
                &get_logger(),
                LogEvent::new("config_changed").with_command(format!("config set {}", key)),
            );

            if json {
                let config = Config::load(&sovereign_dir)?;
                println!("{}", serde_json::to_string_pretty(&config_json(&config))?);
            } else {
                output::success(&format!("Set {} = {}", key, value));
            }
        }
    }

    Ok(())
}
