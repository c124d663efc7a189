//! The score record produced by one evaluation.

use crate::config::WeightTable;
use crate::metrics::{clamp_unit, MetricKind, MetricValue, NOT_APPLICABLE_SENTINEL};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// One sub-metric's value and wall-clock latency.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricResult {
    pub value: MetricValue,
    pub latency_ms: u64,
}

/// Output of one evaluation. Built once, never mutated.
///
/// Serializes as a flat record: `name`, `category`, `net_score`,
/// `net_score_latency`, then `<metric>` and `<metric>_latency` for every
/// metric. Size is a nested device map; a not-applicable metric is `-1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub name: String,
    pub category: String,
    pub net_score: f64,
    /// Sum of per-metric latencies in milliseconds.
    pub net_score_latency: u64,
    pub metrics: BTreeMap<MetricKind, MetricResult>,
}

impl ScoreRecord {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        metrics: BTreeMap<MetricKind, MetricResult>,
        weights: &WeightTable,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            net_score: net_score(&metrics, weights),
            net_score_latency: metrics.values().map(|r| r.latency_ms).sum(),
            metrics,
        }
    }

    pub fn value(&self, kind: MetricKind) -> Option<&MetricValue> {
        self.metrics.get(&kind).map(|r| &r.value)
    }

    /// The plain score of `kind`, if it produced one.
    pub fn score(&self, kind: MetricKind) -> Option<f64> {
        self.value(kind).and_then(MetricValue::as_score)
    }

    pub fn latency(&self, kind: MetricKind) -> Option<u64> {
        self.metrics.get(&kind).map(|r| r.latency_ms)
    }

    /// Whether the composite meets `threshold`.
    pub fn is_acceptable(&self, threshold: f64) -> bool {
        self.net_score >= threshold
    }
}

/// `Σ weight * value` over the collected metrics, clamped into `[0, 1]`.
///
/// Values are normalized before weighting, so a not-applicable metric
/// contributes nothing.
pub fn net_score(metrics: &BTreeMap<MetricKind, MetricResult>, weights: &WeightTable) -> f64 {
    clamp_unit(
        metrics
            .iter()
            .map(|(kind, result)| weights.get(*kind) * result.value.weighted_value())
            .sum(),
    )
}

impl Serialize for ScoreRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4 + 2 * self.metrics.len()))?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("category", &self.category)?;
        map.serialize_entry("net_score", &self.net_score)?;
        map.serialize_entry("net_score_latency", &self.net_score_latency)?;
        for (kind, result) in &self.metrics {
            match &result.value {
                MetricValue::Score(v) => map.serialize_entry(kind.as_str(), v)?,
                MetricValue::NotApplicable => map.serialize_entry(kind.as_str(), &NOT_APPLICABLE_SENTINEL)?,
                MetricValue::ByDevice(devices) => map.serialize_entry(kind.as_str(), devices)?,
            }
            map.serialize_entry(&format!("{}_latency", kind), &result.latency_ms)?;
        }
        map.end()
    }
}
