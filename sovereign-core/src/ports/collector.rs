//! Collector port
//!
//! Defines the interface for producing records from OSINT sources. The
//! export pipeline only consumes `RecordSet`s; which collector fills them is
//! decided once, at startup, from configuration.

use crate::domain::result::Result;
use crate::domain::RecordSet;

/// Collector trait
///
/// Implementations turn a query into records. "Basic" and "comprehensive"
/// collectors differ only in how much context they attach to each record.
pub trait Collector: Send + Sync {
    /// Collector name (e.g., "basic", "comprehensive")
    fn name(&self) -> &str;

    /// Whether records carry cultural context, relevance scores and nested results
    fn is_comprehensive(&self) -> bool;

    /// Collect records for a query
    fn collect(&self, query: &str) -> Result<RecordSet>;
}
