//! Judgment functions.
//!
//! Every sub-metric implements [`Metric`]: a uniform async signature taking
//! a shared [`MetricContext`] and returning a [`MetricValue`]. The engine
//! wraps each call identically for timing, timeouts and failure handling, so
//! implementations simply propagate collaborator errors with `?` and let the
//! engine substitute [`Metric::safe_default`].

mod availability;
mod bus_factor;
mod code_quality;
mod dataset_quality;
mod license;
mod performance;
mod ramp_up;
mod reproducibility;
mod reviewedness;
mod size;
mod tree_score;

pub use availability::DatasetAndCodeMetric;
pub use bus_factor::BusFactorMetric;
pub use code_quality::CodeQualityMetric;
pub use dataset_quality::DatasetQualityMetric;
pub use license::LicenseMetric;
pub use performance::PerformanceClaimsMetric;
pub use ramp_up::RampUpMetric;
pub use reproducibility::ReproducibilityMetric;
pub use reviewedness::{is_code_file, ReviewednessMetric};
pub use size::SizeMetric;
pub use tree_score::TreeScoreMetric;

use crate::artifact::ModelTarget;
use crate::collaborators::{Collaborators, Credentials};
use crate::config::{HubConfig, PopularityBaselines, ScoringConfig};
use crate::engine::{LineageScope, ParentScorer};
use crate::error::{Result, TrustScoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Name of a sub-metric, as it appears in score records and weight tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    SizeScore,
    License,
    RampUpTime,
    BusFactor,
    PerformanceClaims,
    DatasetAndCodeScore,
    DatasetQuality,
    CodeQuality,
    Reproducibility,
    Reviewedness,
    TreeScore,
}

impl MetricKind {
    /// Every metric, in record order.
    pub const ALL: [MetricKind; 11] = [
        MetricKind::SizeScore,
        MetricKind::License,
        MetricKind::RampUpTime,
        MetricKind::BusFactor,
        MetricKind::PerformanceClaims,
        MetricKind::DatasetAndCodeScore,
        MetricKind::DatasetQuality,
        MetricKind::CodeQuality,
        MetricKind::Reproducibility,
        MetricKind::Reviewedness,
        MetricKind::TreeScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::SizeScore => "size_score",
            MetricKind::License => "license",
            MetricKind::RampUpTime => "ramp_up_time",
            MetricKind::BusFactor => "bus_factor",
            MetricKind::PerformanceClaims => "performance_claims",
            MetricKind::DatasetAndCodeScore => "dataset_and_code_score",
            MetricKind::DatasetQuality => "dataset_quality",
            MetricKind::CodeQuality => "code_quality",
            MetricKind::Reproducibility => "reproducibility",
            MetricKind::Reviewedness => "reviewedness",
            MetricKind::TreeScore => "tree_score",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value reported when a metric does not apply (reviewedness without a review host).
pub const NOT_APPLICABLE_SENTINEL: f64 = -1.0;

/// Result of one judgment function.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// A score in `[0, 1]`.
    Score(f64),
    /// The metric does not apply; reported as `-1.0`, weighted as `0.0`.
    NotApplicable,
    /// Per-device scores, keyed by device class name.
    ByDevice(BTreeMap<String, f64>),
}

impl MetricValue {
    /// Clamp every score into `[0, 1]`; NaN becomes `0.0`.
    pub fn clamped(self) -> Self {
        match self {
            MetricValue::Score(v) => MetricValue::Score(clamp_unit(v)),
            MetricValue::NotApplicable => MetricValue::NotApplicable,
            MetricValue::ByDevice(map) => {
                MetricValue::ByDevice(map.into_iter().map(|(k, v)| (k, clamp_unit(v))).collect())
            }
        }
    }

    /// The value that enters the weighted sum.
    ///
    /// Not-applicable normalizes to zero; per-device scores contribute
    /// their mean.
    pub fn weighted_value(&self) -> f64 {
        match self {
            MetricValue::Score(v) => clamp_unit(*v),
            MetricValue::NotApplicable => 0.0,
            MetricValue::ByDevice(map) if map.is_empty() => 0.0,
            MetricValue::ByDevice(map) => {
                clamp_unit(map.values().map(|v| clamp_unit(*v)).sum::<f64>() / map.len() as f64)
            }
        }
    }

    /// The plain score, if this is one.
    pub fn as_score(&self) -> Option<f64> {
        match self {
            MetricValue::Score(v) => Some(*v),
            _ => None,
        }
    }
}

/// Clamp into `[0, 1]`, mapping NaN to `0.0`.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Everything a judgment function may consult during one evaluation.
pub struct MetricContext {
    pub target: ModelTarget,
    pub credentials: Credentials,
    pub collaborators: Collaborators,
    pub config: Arc<ScoringConfig>,
    /// Recursion state for lineage scoring.
    pub scope: LineageScope,
    /// Scores parent models for the tree score.
    pub parents: Arc<dyn ParentScorer>,
    /// Evaluation start; anchors time windows.
    pub started_at: DateTime<Utc>,
}

impl MetricContext {
    /// The model card (README) of the model being rated.
    pub async fn model_card(&self) -> Result<String> {
        self.collaborators
            .host
            .fetch_text_file(&self.target.model, HubConfig::README_FILENAME)
            .await
    }

    /// Ask the completion collaborator for a score and parse the reply.
    pub async fn ask_for_score(&self, prompt: &str) -> Result<f64> {
        let reply = self
            .collaborators
            .completion
            .complete(prompt, &self.credentials)
            .await?;
        parse_score(&reply).ok_or_else(|| TrustScoreError::Completion {
            message: format!("non-numeric completion reply: {:?}", reply),
        })
    }
}

/// One judgment function.
#[async_trait]
pub trait Metric: Send + Sync {
    fn kind(&self) -> MetricKind;

    /// Value used when evaluation fails, panics or times out.
    fn safe_default(&self, _config: &ScoringConfig) -> MetricValue {
        MetricValue::Score(0.0)
    }

    async fn evaluate(&self, ctx: &MetricContext) -> Result<MetricValue>;
}

/// The full metric registry, one instance per [`MetricKind`].
pub fn default_metrics() -> Vec<Arc<dyn Metric>> {
    vec![
        Arc::new(SizeMetric),
        Arc::new(LicenseMetric),
        Arc::new(RampUpMetric),
        Arc::new(BusFactorMetric),
        Arc::new(PerformanceClaimsMetric),
        Arc::new(DatasetAndCodeMetric),
        Arc::new(DatasetQualityMetric),
        Arc::new(CodeQualityMetric),
        Arc::new(ReproducibilityMetric),
        Arc::new(ReviewednessMetric),
        Arc::new(TreeScoreMetric),
    ]
}

/// Parse a completion reply as a score.
///
/// The first whitespace-separated token must be a finite number; it is
/// clamped into `[0, 1]`. Anything else is `None`.
pub fn parse_score(reply: &str) -> Option<f64> {
    let token = reply.split_whitespace().next()?;
    let token = token.trim_end_matches(['.', ',', ';']).trim_matches(['"', '\'', '*', '`']);
    let value: f64 = token.parse().ok()?;
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}

/// Log-normalized popularity from download and like counts.
///
/// Each count maps to `ln(1 + count) / ln(1 + baseline)`, capped at one,
/// and the two are blended with the baseline weights. Missing counts are zero.
pub fn popularity_score(downloads: Option<u64>, likes: Option<u64>, baselines: &PopularityBaselines) -> f64 {
    fn normalized(count: u64, baseline: u64) -> f64 {
        if baseline == 0 {
            return 0.0;
        }
        clamp_unit((count as f64).ln_1p() / (baseline as f64).ln_1p())
    }

    let score = baselines.download_weight * normalized(downloads.unwrap_or(0), baselines.downloads)
        + baselines.like_weight * normalized(likes.unwrap_or(0), baselines.likes);
    debug!("Popularity {:?}/{:?} -> {:.4}", downloads, likes, score);
    clamp_unit(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("0.75"), Some(0.75));
        assert_eq!(parse_score("  1\n"), Some(1.0));
        assert_eq!(parse_score("0.6."), Some(0.6));
        assert_eq!(parse_score("**0.9** because"), Some(0.9));
        assert_eq!(parse_score("-5"), Some(0.0));
        assert_eq!(parse_score("7"), Some(1.0));
        assert_eq!(parse_score("abc"), None);
        assert_eq!(parse_score(""), None);
        assert_eq!(parse_score("NaN"), None);
        assert_eq!(parse_score("inf"), None);
    }

    #[test]
    fn test_popularity_baselines() {
        let model = PopularityBaselines::model();
        assert!((popularity_score(Some(100_000), Some(1_000), &model) - 1.0).abs() < 1e-9);
        assert_eq!(popularity_score(None, None, &model), 0.0);
        assert_eq!(popularity_score(Some(u64::MAX), Some(u64::MAX), &model), 1.0);

        let partial = popularity_score(Some(100_000), Some(0), &model);
        assert!((partial - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_value_normalizes_sentinel() {
        assert_eq!(MetricValue::NotApplicable.weighted_value(), 0.0);
        assert_eq!(MetricValue::Score(1.4).weighted_value(), 1.0);
        assert_eq!(MetricValue::Score(f64::NAN).weighted_value(), 0.0);

        let devices = MetricValue::ByDevice(BTreeMap::from([
            ("a".to_string(), 1.0),
            ("b".to_string(), 0.5),
        ]));
        assert_eq!(devices.weighted_value(), 0.75);
    }

    #[test]
    fn test_metric_kind_names_round_trip_through_serde() {
        for kind in MetricKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_registry_covers_every_kind() {
        let kinds: Vec<MetricKind> = default_metrics().iter().map(|m| m.kind()).collect();
        assert_eq!(kinds, MetricKind::ALL.to_vec());
    }
}
