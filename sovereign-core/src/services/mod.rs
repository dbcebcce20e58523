//! Service layer - the export pipeline and its supporting services
//!
//! Each stage of the pipeline lives in its own module. `ExportService`
//! wires them together for single and batch exports.

pub mod anonymize;
pub mod classify;
pub mod enrich;
mod export;
pub mod logging;
pub mod normalize;
pub mod quality;
pub mod serialize;
pub mod template;

pub use anonymize::{Anonymizer, IdentifierKind};
pub use classify::{Ambiguity, Classification, SensitivityClassifier, Signal};
pub use enrich::{assess_kenyan_impact, context_summary, enhance_with_osint_context, kenyan_relevance};
pub use export::ExportService;
pub use logging::{EntryPoint, ExportTally, LogEntry, LogEvent, LogFilter, LoggingService};
pub use normalize::{normalize, Normalized};
pub use quality::assess;
pub use serialize::{is_well_formed, parse, serialize, ExportMetadata};
pub use template::{ReportLayout, Template, TemplateField, TemplateSelector};
