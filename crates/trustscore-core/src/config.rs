//! Centralized configuration for trustscore.
//!
//! Compile-time constants for network plumbing live in the unit structs at
//! the top of this module. Everything that shapes a score (weights,
//! thresholds, baselines, device classes) lives in [`ScoringConfig`], which
//! is runtime data so divergent scoring policies can be selected without a
//! rebuild.

use crate::error::{Result, TrustScoreError};
use crate::metrics::MetricKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);
    /// Bound on a shallow clone or a lint run of a code repository.
    pub const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(180);
    pub const MAX_RETRIES: u32 = 3;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
    pub const USER_AGENT: &'static str = "trustscore/0.3";
}

/// HuggingFace Hub endpoints and well-known filenames.
pub struct HubConfig;

impl HubConfig {
    pub const HUB_BASE: &'static str = "https://huggingface.co";
    pub const API_BASE: &'static str = "https://huggingface.co/api";
    pub const DEFAULT_REVISION: &'static str = "main";
    pub const README_FILENAME: &'static str = "README.md";
    pub const LICENSE_FILENAME: &'static str = "LICENSE";
    pub const MANIFEST_FILENAME: &'static str = "config.json";
    pub const MAX_COMMIT_PAGES: u32 = 10;
}

/// GitHub API configuration.
pub struct GitHubConfig;

impl GitHubConfig {
    pub const API_BASE: &'static str = "https://api.github.com";
    pub const PER_PAGE: u32 = 100;
    pub const MAX_PAGES: u32 = 10;
    pub const MAX_MERGED_REQUESTS: usize = 400;
    pub const DETAIL_CONCURRENCY: usize = 8;
}

/// Language-model completion defaults.
pub struct CompletionConfig;

impl CompletionConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "https://genai.rcac.purdue.edu/api/chat/completions";
    pub const DEFAULT_MODEL: &'static str = "llama3.1:latest";
    pub const ENDPOINT_ENV_VAR: &'static str = "COMPLETION_ENDPOINT";
    pub const MODEL_ENV_VAR: &'static str = "COMPLETION_MODEL";
}

/// Tolerance used when checking that a weight table sums to one.
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Linear weights applied to sub-metric values when computing the net score.
///
/// Metrics without an entry carry weight zero. The table is plain data so
/// either historical policy (or a custom one) can be loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(BTreeMap<MetricKind, f64>);

impl WeightTable {
    /// Seven-metric table without reproducibility, reviewedness or tree score.
    pub fn standard() -> Self {
        Self(BTreeMap::from([
            (MetricKind::License, 0.25),
            (MetricKind::RampUpTime, 0.30),
            (MetricKind::BusFactor, 0.10),
            (MetricKind::DatasetQuality, 0.095),
            (MetricKind::CodeQuality, 0.005),
            (MetricKind::PerformanceClaims, 0.20),
            (MetricKind::DatasetAndCodeScore, 0.05),
        ]))
    }

    /// Ten-metric table: the standard weights scaled to 0.86 plus
    /// reproducibility, reviewedness and tree score.
    pub fn extended() -> Self {
        let mut weights: BTreeMap<MetricKind, f64> = Self::standard()
            .0
            .into_iter()
            .map(|(kind, weight)| (kind, weight * 0.86))
            .collect();
        weights.insert(MetricKind::Reproducibility, 0.08);
        weights.insert(MetricKind::Reviewedness, 0.04);
        weights.insert(MetricKind::TreeScore, 0.02);
        Self(weights)
    }

    /// Build a table from explicit entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (MetricKind, f64)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Weight for a metric (zero when absent).
    pub fn get(&self, kind: MetricKind) -> f64 {
        self.0.get(&kind).copied().unwrap_or(0.0)
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Iterate over `(metric, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, f64)> + '_ {
        self.0.iter().map(|(kind, weight)| (*kind, *weight))
    }

    /// Check that every weight is finite and non-negative and that they sum to one.
    pub fn validate(&self) -> Result<()> {
        for (kind, weight) in self.iter() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(TrustScoreError::Validation {
                    field: format!("weights.{}", kind),
                    message: format!("weight must be a non-negative number, got {}", weight),
                });
            }
        }

        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(TrustScoreError::Validation {
                field: "weights".to_string(),
                message: format!("weights must sum to 1.0, got {:.6}", total),
            });
        }
        Ok(())
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::extended()
    }
}

/// Baselines for log-normalizing download and like counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularityBaselines {
    /// Download count that maps to a download score of 1.0.
    pub downloads: u64,
    /// Like count that maps to a like score of 1.0.
    pub likes: u64,
    pub download_weight: f64,
    pub like_weight: f64,
}

impl PopularityBaselines {
    /// Baselines applied to the model's own popularity.
    pub fn model() -> Self {
        Self {
            downloads: 100_000,
            likes: 1_000,
            download_weight: 0.7,
            like_weight: 0.3,
        }
    }

    /// Baselines applied to the linked dataset's popularity.
    pub fn dataset() -> Self {
        Self {
            downloads: 1_000_000,
            likes: 10_000,
            download_weight: 0.7,
            like_weight: 0.3,
        }
    }
}

/// Maintainer-diversity policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusFactorPolicy {
    /// Trailing window of commit history considered, in days.
    pub window_days: i64,
    /// An author is significant when their share of windowed commits exceeds this percentage.
    pub significance_percent: f64,
    /// Number of significant authors that saturates the score at 1.0.
    pub saturation_authors: u32,
}

impl Default for BusFactorPolicy {
    fn default() -> Self {
        Self {
            window_days: 912,
            significance_percent: 4.0,
            saturation_authors: 5,
        }
    }
}

/// One defect-density tier: codebases below `below_lines` use `multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyTier {
    pub below_lines: u64,
    pub multiplier: f64,
}

/// Static-analysis scoring policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeQualityPolicy {
    /// Score when the repository was fetched but holds no analyzable source.
    pub no_source_score: f64,
    /// Tiers ordered by ascending `below_lines`.
    pub tiers: Vec<PenaltyTier>,
    /// Multiplier for codebases larger than every tier. Multipliers shrink as
    /// the codebase grows.
    pub large_multiplier: f64,
}

impl Default for CodeQualityPolicy {
    fn default() -> Self {
        Self {
            no_source_score: 0.5,
            tiers: vec![
                PenaltyTier { below_lines: 500, multiplier: 50.0 },
                PenaltyTier { below_lines: 5_000, multiplier: 25.0 },
                PenaltyTier { below_lines: 20_000, multiplier: 10.0 },
            ],
            large_multiplier: 2.0,
        }
    }
}

impl CodeQualityPolicy {
    /// Penalty multiplier for a codebase of `lines` lines.
    pub fn multiplier_for(&self, lines: u64) -> f64 {
        self.tiers
            .iter()
            .find(|tier| lines < tier.below_lines)
            .map(|tier| tier.multiplier)
            .unwrap_or(self.large_multiplier)
    }
}

/// A target deployment device and the largest artifact it comfortably holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceClass {
    pub name: String,
    /// `None` means the device has no size limit.
    pub max_bytes: Option<u64>,
}

impl DeviceClass {
    pub fn new(name: impl Into<String>, max_bytes: Option<u64>) -> Self {
        Self {
            name: name.into(),
            max_bytes,
        }
    }

    /// Default device classes.
    pub fn defaults() -> Vec<Self> {
        const GIB: u64 = 1024 * 1024 * 1024;
        vec![
            Self::new("raspberry_pi", Some(GIB)),
            Self::new("jetson_nano", Some(2 * GIB)),
            Self::new("desktop_pc", Some(16 * GIB)),
            Self::new("aws_server", None),
        ]
    }
}

/// Lineage resolution and tree-score policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineagePolicy {
    /// At most this many immediate parents contribute to the tree score.
    pub max_parents: usize,
    /// Breadth-first expansion stops after this many hops from the root.
    pub max_depth: usize,
    /// Manifest tokens shorter than this never match an artifact name.
    pub min_token_len: usize,
    /// Nested evaluations allowed below the artifact being rated.
    pub max_recursion: u32,
    /// Manifest file fetched for every expanded node.
    pub manifest_filename: String,
}

impl Default for LineagePolicy {
    fn default() -> Self {
        Self {
            max_parents: 5,
            max_depth: 3,
            min_token_len: 3,
            max_recursion: 1,
            manifest_filename: HubConfig::MANIFEST_FILENAME.to_string(),
        }
    }
}

/// Runtime scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: WeightTable,
    /// Accepted license identifiers (lowercase).
    pub license_allow_list: Vec<String>,
    pub ramp_up_popularity: PopularityBaselines,
    /// Share of the ramp-up score taken from popularity when it is available.
    pub ramp_up_popularity_share: f64,
    pub dataset_popularity: PopularityBaselines,
    /// Share of dataset quality taken from the language-model judgment when both signals exist.
    pub dataset_llm_share: f64,
    pub bus_factor: BusFactorPolicy,
    pub code_quality: CodeQualityPolicy,
    pub reproducibility_timeout_secs: u64,
    pub devices: Vec<DeviceClass>,
    pub lineage: LineagePolicy,
    /// Upper bound on a single judgment function before it takes its safe default.
    pub metric_timeout_secs: u64,
    /// Net score at or above which an artifact is acceptable for ingest.
    pub acceptance_threshold: f64,
    /// Model-card characters forwarded to a completion prompt.
    pub max_prompt_chars: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: WeightTable::default(),
            license_allow_list: ["mit", "bsd", "lgpl", "apache-2.0"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ramp_up_popularity: PopularityBaselines::model(),
            ramp_up_popularity_share: 0.8,
            dataset_popularity: PopularityBaselines::dataset(),
            dataset_llm_share: 0.5,
            bus_factor: BusFactorPolicy::default(),
            code_quality: CodeQualityPolicy::default(),
            reproducibility_timeout_secs: 60,
            devices: DeviceClass::defaults(),
            lineage: LineagePolicy::default(),
            metric_timeout_secs: 300,
            acceptance_threshold: 0.5,
            max_prompt_chars: 12_000,
        }
    }
}

impl ScoringConfig {
    /// Load and validate a configuration from a JSON file.
    ///
    /// Missing fields take their defaults, so a file containing only
    /// `{"weights": {...}}` is valid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TrustScoreError::io_with_path(e, path))?;
        let config: ScoringConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn reproducibility_timeout(&self) -> Duration {
        Duration::from_secs(self.reproducibility_timeout_secs)
    }

    pub fn metric_timeout(&self) -> Duration {
        Duration::from_secs(self.metric_timeout_secs)
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;

        check_unit("ramp_up_popularity_share", self.ramp_up_popularity_share)?;
        check_unit("dataset_llm_share", self.dataset_llm_share)?;
        check_unit("acceptance_threshold", self.acceptance_threshold)?;
        check_unit("code_quality.no_source_score", self.code_quality.no_source_score)?;

        for (field, baselines) in [
            ("ramp_up_popularity", &self.ramp_up_popularity),
            ("dataset_popularity", &self.dataset_popularity),
        ] {
            if baselines.downloads == 0 || baselines.likes == 0 {
                return Err(TrustScoreError::Validation {
                    field: field.to_string(),
                    message: "popularity baselines must be positive".to_string(),
                });
            }
        }

        let percent = self.bus_factor.significance_percent;
        if !(0.0..100.0).contains(&percent) {
            return Err(TrustScoreError::Validation {
                field: "bus_factor.significance_percent".to_string(),
                message: format!("must be in [0, 100), got {}", percent),
            });
        }
        if self.bus_factor.saturation_authors == 0 || self.bus_factor.window_days <= 0 {
            return Err(TrustScoreError::Validation {
                field: "bus_factor".to_string(),
                message: "window and saturation must be positive".to_string(),
            });
        }

        if self.devices.is_empty() {
            return Err(TrustScoreError::Validation {
                field: "devices".to_string(),
                message: "at least one device class is required".to_string(),
            });
        }
        if self.devices.iter().any(|d| d.max_bytes == Some(0)) {
            return Err(TrustScoreError::Validation {
                field: "devices".to_string(),
                message: "device size limits must be positive".to_string(),
            });
        }

        if self.lineage.max_parents == 0 {
            return Err(TrustScoreError::Validation {
                field: "lineage.max_parents".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.license_allow_list.is_empty() {
            return Err(TrustScoreError::Validation {
                field: "license_allow_list".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

fn check_unit(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TrustScoreError::Validation {
            field: field.to_string(),
            message: format!("must be in [0, 1], got {}", value),
        })
    }
}
