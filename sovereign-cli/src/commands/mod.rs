//! CLI command implementations

pub mod batch;
pub mod collect;
pub mod config;
pub mod export;
pub mod logs;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use sovereign_core::{EntryPoint, LogEvent, LoggingService, SovereignContext};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<Arc<LoggingService>> {
    let sovereign_dir = get_sovereign_dir().ok()?;
    std::fs::create_dir_all(&sovereign_dir).ok()?;
    LoggingService::new(&sovereign_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
        .ok()
        .map(Arc::new)
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<Arc<LoggingService>>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the sovereign directory from environment or default
pub fn get_sovereign_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SOVEREIGN_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".sovereign"))
        .context("Could not find home directory; set SOVEREIGN_DIR")
}

/// Build the context for a command, logging the command itself
pub fn get_context(command: &str) -> Result<SovereignContext> {
    let sovereign_dir = get_sovereign_dir()?;

    std::fs::create_dir_all(&sovereign_dir)
        .with_context(|| format!("Failed to create sovereign directory: {:?}", sovereign_dir))?;

    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command(command));

    SovereignContext::new(&sovereign_dir, logger).context("Failed to initialize sovereign context")
}

/// Read input records from a file, or from stdin when piped
pub fn read_input(file: Option<&Path>) -> Result<Value> {
    let content = if let Some(path) = file {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {:?}", path))?
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read records from stdin")?;
        buffer
    } else {
        anyhow::bail!("No input provided. Pass a JSON file or pipe records from stdin.");
    };

    serde_json::from_str(&content).context("Input is not valid JSON")
}
