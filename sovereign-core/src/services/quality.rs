//! Export quality assessment

use crate::config::QualityWeights;
use crate::domain::{QualityScore, Record, RecordSet};
use crate::services::enrich::kenyan_relevance;

/// What the assessor needs to know about one export
pub struct QualityInput<'a> {
    /// Records handed to the export, after normalization
    pub input: &'a RecordSet,
    /// Records as emitted, paired with the record they came from
    pub emitted: &'a [(Record, &'a Record)],
    /// Whether the serialized artifact is well formed
    pub valid: bool,
}

/// Score an export with the given weighting
pub fn assess(input: &QualityInput<'_>, weights: &QualityWeights) -> QualityScore {
    let coverage = if input.input.is_empty() {
        0.0
    } else {
        input.emitted.len() as f64 / input.input.len() as f64
    };

    let completeness = mean(input.emitted.iter().map(|(emitted, source)| {
        if source.is_empty() {
            0.0
        } else {
            (emitted.len() as f64 / source.len() as f64).min(1.0)
        }
    }));

    let context = mean(input.emitted.iter().map(|(_, source)| kenyan_relevance(source)));
    let validity = if input.valid { 1.0 } else { 0.0 };

    let total = weights.total();
    let overall = if total > 0.0 {
        (coverage * weights.coverage
            + completeness * weights.completeness
            + context * weights.context
            + validity * weights.validity)
            / total
    } else {
        0.0
    };

    QualityScore {
        coverage,
        completeness,
        context,
        validity,
        overall: overall.clamp(0.0, 1.0),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_full_export_of_kenyan_record_scores_one() {
        let source = record(json!({"title": "Nairobi", "kenyan_relevance": 1.0}));
        let input = RecordSet::new(vec![source.clone()]);
        let emitted = vec![(source.clone(), &input.records()[0])];
        let score = assess(
            &QualityInput { input: &input, emitted: &emitted, valid: true },
            &QualityWeights::default(),
        );
        assert_eq!(score.coverage, 1.0);
        assert_eq!(score.completeness, 1.0);
        assert_eq!(score.context, 1.0);
        assert!((score.overall - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_export() {
        let a = record(json!({"query": "a", "internal": 1}));
        let b = record(json!({"query": "b"}));
        let input = RecordSet::new(vec![a.clone(), b]);
        let emitted = vec![(record(json!({"query": "a"})), &input.records()[0])];
        let score = assess(
            &QualityInput { input: &input, emitted: &emitted, valid: true },
            &QualityWeights::default(),
        );
        assert_eq!(score.coverage, 0.5);
        assert_eq!(score.completeness, 0.5);
        assert_eq!(score.context, 0.0);
        // 0.5*0.3 + 0.5*0.3 + 0*0.2 + 1*0.2
        assert!((score.overall - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_valid_empty_export_still_scores_above_zero() {
        let input = RecordSet::default();
        let score = assess(
            &QualityInput { input: &input, emitted: &[], valid: true },
            &QualityWeights::default(),
        );
        assert!(score.overall > 0.0);
        assert_eq!(score.coverage, 0.0);
    }

    #[test]
    fn test_custom_weights() {
        let source = record(json!({"query": "x"}));
        let input = RecordSet::new(vec![source.clone()]);
        let emitted = vec![(source, &input.records()[0])];
        let weights = QualityWeights {
            coverage: 0.0,
            completeness: 0.0,
            context: 1.0,
            validity: 1.0,
        };
        let score = assess(&QualityInput { input: &input, emitted: &emitted, valid: true }, &weights);
        assert!((score.overall - 0.5).abs() < 1e-9);
    }
}
