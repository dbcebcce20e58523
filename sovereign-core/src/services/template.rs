//! Template selector - which fields each user type receives, and their labels
//!
//! Every user type has a fixed, ordered allowlist. Fields a record doesn't
//! carry are simply left out. Government exports additionally need an
//! explicit permission flag, checked before anything reaches a serializer.

use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::{Record, RecordSet, UserType};

/// A field to emit and its display label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemplateField {
    pub name: &'static str,
    pub label: &'static str,
}

const fn field(name: &'static str, label: &'static str) -> TemplateField {
    TemplateField { name, label }
}

const JOURNALIST_FIELDS: &[TemplateField] = &[
    field("query", "Query"),
    field("title", "Headline"),
    field("content", "Story"),
    field("source", "Source"),
    field("timestamp", "Published"),
    field("sources", "Sources"),
    field("cultural_context", "Cultural Context"),
    field("county", "County"),
    field("verification_status", "Verification Status"),
    field("public_interest_score", "Public Interest Score"),
    field("kenyan_impact", "Kenyan Impact"),
    field("url", "Link"),
];

const RESEARCHER_FIELDS: &[TemplateField] = &[
    field("query", "Research Query"),
    field("title", "Title"),
    field("content", "Finding"),
    field("source", "Source"),
    field("timestamp", "Collected"),
    field("results", "Results"),
    field("methodology", "Methodology"),
    field("data_type", "Data Type"),
    field("data_types", "Data Types"),
    field("sources", "References"),
    field("kenyan_relevance", "Kenyan Relevance"),
    field("kenyan_relevance_score", "Kenyan Relevance Score"),
    field("cultural_context", "Cultural Context"),
    field("limitations", "Limitations"),
];

const NGO_FIELDS: &[TemplateField] = &[
    field("query", "Issue"),
    field("title", "Title"),
    field("content", "Evidence"),
    field("source", "Source"),
    field("timestamp", "Date"),
    field("county", "County"),
    field("region", "Region"),
    field("topics", "Topics"),
    field("community_impact", "Community Impact"),
    field("cultural_context", "Cultural Context"),
    field("kenyan_relevance", "Kenyan Relevance"),
    field("stakeholders", "Stakeholders"),
];

const DEVELOPER_FIELDS: &[TemplateField] = &[
    field("query", "Query"),
    field("title", "Title"),
    field("content", "Payload"),
    field("source", "Source"),
    field("timestamp", "Timestamp"),
    field("data_type", "Data Type"),
    field("data_types", "Data Types"),
    field("technical_fields", "Technical Fields"),
    field("results", "Results"),
    field("source_type", "Source Type"),
    field("api_endpoint", "API Endpoint"),
    field("data_quality_score", "Data Quality Score"),
    field("osint_source", "OSINT Source"),
    field("verification_indicators", "Verification Indicators"),
];

const GOVERNMENT_FIELDS: &[TemplateField] = &[
    field("query", "Query"),
    field("title", "Title"),
    field("content", "Content"),
    field("source", "Source"),
    field("timestamp", "Timestamp"),
    field("sources", "Sources"),
    field("results", "Results"),
    field("county", "County"),
    field("region", "Region"),
    field("topics", "Topics"),
    field("cultural_context", "Cultural Context"),
    field("methodology", "Methodology"),
    field("data_type", "Data Type"),
    field("data_types", "Data Types"),
    field("technical_fields", "Technical Fields"),
    field("source_type", "Source Type"),
    field("api_endpoint", "API Endpoint"),
    field("verification_status", "Verification Status"),
    field("verification_indicators", "Verification Indicators"),
    field("osint_source", "OSINT Source"),
    field("public_interest_score", "Public Interest Score"),
    field("kenyan_impact", "Kenyan Impact"),
    field("community_impact", "Community Impact"),
    field("stakeholders", "Stakeholders"),
    field("kenyan_relevance", "Kenyan Relevance"),
    field("kenyan_relevance_score", "Kenyan Relevance Score"),
    field("data_quality_score", "Data Quality Score"),
    field("limitations", "Limitations"),
    field("url", "Link"),
    field("national_id", "National ID"),
    field("phone_number", "Phone Number"),
    field("email", "Email"),
    field("data_sensitivity", "Declared Sensitivity"),
];

/// Report layout per user type, carried into structured exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportLayout {
    pub format: &'static str,
    pub sections: &'static [&'static str],
    pub kenyan_context: &'static [&'static str],
}

/// Fields selected for one record or one record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub user_type: UserType,
    pub fields: Vec<TemplateField>,
}

impl Template {
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Project a record onto this template, in template order
    pub fn apply(&self, record: &Record) -> Record {
        let mut out = Record::new();
        for f in &self.fields {
            if let Some(value) = record.get(f.name) {
                out.insert(f.name, value.clone());
            }
        }
        out
    }
}

/// Maps (user type, fields present) to the template to emit
pub struct TemplateSelector;

impl TemplateSelector {
    /// The full ordered allowlist for a user type
    pub fn allowlist(user_type: UserType) -> &'static [TemplateField] {
        match user_type {
            UserType::Journalist => JOURNALIST_FIELDS,
            UserType::Researcher => RESEARCHER_FIELDS,
            UserType::Ngo => NGO_FIELDS,
            UserType::Developer => DEVELOPER_FIELDS,
            UserType::Government => GOVERNMENT_FIELDS,
        }
    }

    pub fn is_allowed(user_type: UserType, field_name: &str) -> bool {
        Self::allowlist(user_type).iter().any(|f| f.name == field_name)
    }

    /// Fail with `PermissionDenied` when the user type needs a permission the call lacks
    pub fn authorize(user_type: UserType, government_permission: bool) -> Result<()> {
        if user_type.requires_permission() && !government_permission {
            return Err(Error::permission_denied(format!(
                "{} exports require explicit permission",
                user_type
            )));
        }
        Ok(())
    }

    /// Template for a single record: the allowlist filtered to fields it carries
    pub fn select(user_type: UserType, record: &Record) -> Template {
        Template {
            user_type,
            fields: Self::allowlist(user_type)
                .iter()
                .filter(|f| record.contains(f.name))
                .copied()
                .collect(),
        }
    }

    /// Template for a whole set: allowlisted fields present in any record.
    ///
    /// Tabular output uses this as its header.
    pub fn select_for_set(user_type: UserType, records: &RecordSet) -> Template {
        Template {
            user_type,
            fields: Self::allowlist(user_type)
                .iter()
                .filter(|f| records.iter().any(|r| r.contains(f.name)))
                .copied()
                .collect(),
        }
    }

    pub fn layout(user_type: UserType) -> ReportLayout {
        match user_type {
            UserType::Journalist => ReportLayout {
                format: "investigative_report",
                sections: &["executive_summary", "key_findings", "sources", "ethical_considerations"],
                kenyan_context: &["political_implications", "public_interest_justification"],
            },
            UserType::Researcher => ReportLayout {
                format: "academic_paper",
                sections: &["abstract", "methodology", "findings", "discussion", "references"],
                kenyan_context: &["literature_review", "local_methodology_adaptation"],
            },
            UserType::Ngo => ReportLayout {
                format: "policy_brief",
                sections: &["issue_overview", "evidence", "recommendations", "stakeholder_analysis"],
                kenyan_context: &["community_impact", "local_partnerships"],
            },
            UserType::Developer => ReportLayout {
                format: "technical_report",
                sections: &["data_schema", "methodology", "limitations", "api_documentation"],
                kenyan_context: &["local_data_standards", "infrastructure_considerations"],
            },
            UserType::Government => ReportLayout {
                format: "briefing_note",
                sections: &["situation_summary", "findings", "sources", "handling_instructions"],
                kenyan_context: &["county_implications", "data_protection_obligations"],
            },
        }
    }
}
