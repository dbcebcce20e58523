//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Offline demo collectors for the Collector port

pub mod demo;

use crate::config::CollectorMode;
use crate::ports::Collector;

/// Build the collector selected by configuration
pub fn collector_for(mode: CollectorMode) -> Box<dyn Collector> {
    match mode {
        CollectorMode::Basic => Box::new(demo::BasicCollector),
        CollectorMode::Comprehensive => Box::new(demo::ComprehensiveCollector),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_selection() {
        assert_eq!(collector_for(CollectorMode::Basic).name(), "basic");
        let comprehensive = collector_for(CollectorMode::Comprehensive);
        assert_eq!(comprehensive.name(), "comprehensive");
        assert!(comprehensive.is_comprehensive());
    }
}
