//! Reviewedness: share of code added through approved review requests.

use super::{clamp_unit, Metric, MetricContext, MetricKind, MetricValue};
use crate::collaborators::ReviewRequest;
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

/// Extensions counted as source or configuration code.
const CODE_EXTENSIONS: &[&str] = &[
    "py", "ipynb", "js", "ts", "jsx", "tsx", "java", "c", "cc", "cpp", "h", "hpp", "go", "rs", "rb",
    "swift", "kt", "m", "mm", "sh", "ps1", "r", "jl", "yml", "yaml", "json", "toml", "ini", "cfg",
    "mk", "sql", "pl",
];

/// Path segments that hold weights or generated artifacts rather than code.
const NON_CODE_SEGMENTS: &[&str] = &["/weights/", "/checkpoints/", "/artifacts/", "/models/"];

/// Whether a changed file counts as code.
///
/// Weight, archive, data, image and document extensions never count; files
/// under weight or artifact directories never count.
pub fn is_code_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    let anchored = format!("/{}", lower);
    if NON_CODE_SEGMENTS.iter().any(|seg| anchored.contains(seg)) {
        return false;
    }
    let Some((_, ext)) = lower.rsplit_once('.') else {
        return false;
    };
    if ext.contains('/') {
        return false;
    }
    CODE_EXTENSIONS.contains(&ext)
}

/// Reviewed code additions over total code additions.
pub fn reviewed_fraction(requests: &[ReviewRequest]) -> f64 {
    let mut total = 0u64;
    let mut reviewed = 0u64;
    for request in requests.iter().filter(|r| r.is_merged()) {
        let added: u64 = request
            .changed_files
            .iter()
            .filter(|f| is_code_file(&f.path))
            .map(|f| f.added_lines)
            .sum();
        total += added;
        if request.is_approved() {
            reviewed += added;
        }
    }

    if total == 0 {
        return 0.0;
    }
    clamp_unit(reviewed as f64 / total as f64)
}

pub struct ReviewednessMetric;

#[async_trait]
impl Metric for ReviewednessMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Reviewedness
    }

    async fn evaluate(&self, ctx: &MetricContext) -> Result<MetricValue> {
        let Some(code) = ctx.target.code.as_ref().filter(|c| c.host.is_review_host()) else {
            return Ok(MetricValue::NotApplicable);
        };

        let requests = ctx.collaborators.reviews.fetch_review_requests(code).await?;
        let fraction = reviewed_fraction(&requests);
        debug!("{}: {} review requests, reviewed fraction {:.3}", code.repo_id(), requests.len(), fraction);
        Ok(MetricValue::Score(fraction))
    }
}
