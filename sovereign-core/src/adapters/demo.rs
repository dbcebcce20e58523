//! Offline demo collectors
//!
//! Both collectors search a fixed set of Kenyan news items, so the pipeline
//! can be exercised end to end without any network access:
//! - `BasicCollector`: query, title, content, source, timestamp
//! - `ComprehensiveCollector`: the basic fields plus county, cultural
//!   context, relevance score, data types and nested results

use serde_json::json;

use crate::domain::result::Result;
use crate::domain::{Record, RecordSet};
use crate::ports::Collector;

struct DemoItem {
    title: &'static str,
    content: &'static str,
    source: &'static str,
    published: &'static str,
    county: &'static str,
    region: &'static str,
    topics: &'static [&'static str],
    local_entities: &'static [&'static str],
    relevance: f64,
}

const DEMO_ITEMS: &[DemoItem] = &[
    DemoItem {
        title: "Nairobi County Budget Analysis 2024",
        content: "Analysis of budget allocation across Nairobi constituencies, with roads and drainage taking the largest share",
        source: "County Government Portal",
        published: "2024-06-14T09:00:00Z",
        county: "Nairobi",
        region: "Nairobi",
        topics: &["budget", "development", "governance"],
        local_entities: &["Nairobi City County Assembly"],
        relevance: 0.9,
    },
    DemoItem {
        title: "Nairobi Expressway Traffic Review",
        content: "Commuter volumes on the Nairobi Expressway and their effect on feeder roads in the city",
        source: "Daily Nation",
        published: "2024-05-02T07:30:00Z",
        county: "Nairobi",
        region: "Nairobi",
        topics: &["infrastructure", "transport"],
        local_entities: &["Kenya National Highways Authority"],
        relevance: 0.85,
    },
    DemoItem {
        title: "Mombasa Port Efficiency Report",
        content: "Study of port operations and economic impact on the Coastal region",
        source: "KPA Annual Report",
        published: "2024-03-21T12:00:00Z",
        county: "Mombasa",
        region: "Coast",
        topics: &["economy", "infrastructure", "trade"],
        local_entities: &["Kenya Ports Authority"],
        relevance: 0.8,
    },
    DemoItem {
        title: "Preserving Lamu's Swahili Architecture",
        content: "Community-led initiatives to maintain traditional building techniques in Lamu Old Town, a UNESCO World Heritage site",
        source: "local_news",
        published: "2024-02-10T10:15:00Z",
        county: "Lamu",
        region: "Coast",
        topics: &["swahili_architecture", "cultural_preservation"],
        local_entities: &["Lamu Old Town UNESCO Site", "Swahili Cultural Center"],
        relevance: 0.95,
    },
    DemoItem {
        title: "Kisumu Lakefront Fisheries Update",
        content: "Fish stocks and cooperative incomes along the Lake Victoria shoreline in Kisumu",
        source: "The Standard",
        published: "2024-04-08T16:45:00Z",
        county: "Kisumu",
        region: "Nyanza",
        topics: &["economy", "fisheries"],
        local_entities: &["Kisumu Fishermen Cooperative"],
        relevance: 0.75,
    },
    DemoItem {
        title: "Kenyan Digital Economy Outlook",
        content: "Mobile money adoption and youth employment in the Kenyan digital economy",
        source: "Business Daily",
        published: "2024-01-29T08:00:00Z",
        county: "National",
        region: "National",
        topics: &["economy", "technology", "youth"],
        local_entities: &["Communications Authority of Kenya"],
        relevance: 0.7,
    },
];

/// Query terms worth matching on (at least three characters, lowercased)
fn query_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 3)
        .map(str::to_lowercase)
        .collect()
}

fn matches(item: &DemoItem, terms: &[String]) -> bool {
    let haystack = format!("{} {} {}", item.title, item.content, item.county).to_lowercase();
    terms.iter().any(|t| haystack.contains(t.as_str()))
}

fn basic_record(query: &str, item: &DemoItem) -> Record {
    Record::new()
        .with("query", query)
        .with("title", item.title)
        .with("content", item.content)
        .with("source", item.source)
        .with("timestamp", item.published)
}

fn search(query: &str) -> impl Iterator<Item = &'static DemoItem> {
    let terms = query_terms(query);
    DEMO_ITEMS.iter().filter(move |item| matches(item, &terms))
}

/// Collector emitting the core fields only
#[derive(Debug, Default)]
pub struct BasicCollector;

impl Collector for BasicCollector {
    fn name(&self) -> &str {
        "basic"
    }

    fn is_comprehensive(&self) -> bool {
        false
    }

    fn collect(&self, query: &str) -> Result<RecordSet> {
        Ok(search(query).map(|item| basic_record(query, item)).collect())
    }
}

/// Collector that attaches Kenyan cultural context to every record
#[derive(Debug, Default)]
pub struct ComprehensiveCollector;

impl Collector for ComprehensiveCollector {
    fn name(&self) -> &str {
        "comprehensive"
    }

    fn is_comprehensive(&self) -> bool {
        true
    }

    fn collect(&self, query: &str) -> Result<RecordSet> {
        Ok(search(query)
            .map(|item| {
                basic_record(query, item)
                    .with("county", item.county)
                    .with(
                        "cultural_context",
                        json!({
                            "region": item.region,
                            "topics": item.topics,
                            "local_entities": item.local_entities,
                        }),
                    )
                    .with("kenyan_relevance_score", item.relevance)
                    .with("data_types", json!(["news"]))
                    .with(
                        "results",
                        json!([{
                            "title": item.title,
                            "source": item.source,
                            "kenyan_relevance": item.relevance,
                            "data_sensitivity": "public",
                            "data_type": "news",
                        }]),
                    )
            })
            .collect())
    }
}
