//! Sovereign Core - export pipeline for Kenyan-focused OSINT data
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core value types (Record, UserType, ExportResult, etc.)
//! - **ports**: Trait definitions for external dependencies (Collector)
//! - **services**: Normalize, classify, template, serialize, batch export
//! - **adapters**: Concrete implementations (offline demo collectors)

pub mod adapters;
pub mod config;
pub mod domain;
mod log_migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use config::Config;
use ports::Collector;
use services::ExportService;

// Re-export commonly used types at crate root
pub use domain::{
    BatchFailure, BatchReport, ExportFormat, ExportRequest, ExportResult, ExportStage, QualityScore, Record,
    RecordSet, SensitivityLevel, UserType,
};
pub use domain::result::{Error, OperationResult};
pub use services::{EntryPoint, LogEvent, LoggingService};

/// Main context for Sovereign operations
///
/// Holds the loaded configuration, the export service and the configured
/// collector.
pub struct SovereignContext {
    pub config: Config,
    pub export_service: ExportService,
    pub collector: Box<dyn Collector>,
}

impl SovereignContext {
    /// Create a context from the settings in `sovereign_dir`
    pub fn new(sovereign_dir: &Path, logger: Option<Arc<LoggingService>>) -> Result<Self> {
        let config = Config::load(sovereign_dir)?;

        let mut export_service = ExportService::new(config.clone());
        if let Some(logger) = logger {
            export_service = export_service.with_logger(logger);
        }
        let collector = adapters::collector_for(config.collector);

        Ok(Self {
            config,
            export_service,
            collector,
        })
    }
}
