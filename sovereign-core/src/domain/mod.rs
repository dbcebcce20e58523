//! Core domain entities
//!
//! All export entities are defined here. These are pure value types with
//! validation logic - no I/O or external dependencies.

mod export;
mod record;
mod user_type;
pub mod result;

pub use export::{
    BatchFailure, BatchReport, ExportFormat, ExportRequest, ExportResult, ExportStage, QualityScore,
};
pub use record::{Record, RecordSet, CONTENT_FIELDS};
pub use user_type::{SensitivityLevel, UserType};
