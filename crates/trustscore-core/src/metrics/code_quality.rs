//! Code quality from static-analysis defect density.

use super::{clamp_unit, Metric, MetricContext, MetricKind, MetricValue};
use crate::collaborators::CodeAnalysis;
use crate::config::CodeQualityPolicy;
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

pub struct CodeQualityMetric;

/// Score an analysed repository.
///
/// No source lines scores the policy's neutral value, no issues scores one,
/// otherwise `1 - (issues / lines) * multiplier` with a size-tiered multiplier.
pub fn code_quality_score(analysis: CodeAnalysis, policy: &CodeQualityPolicy) -> f64 {
    if analysis.source_lines == 0 {
        return policy.no_source_score;
    }
    if analysis.issue_count == 0 {
        return 1.0;
    }
    let density = analysis.issue_count as f64 / analysis.source_lines as f64;
    clamp_unit(1.0 - density * policy.multiplier_for(analysis.source_lines))
}

#[async_trait]
impl Metric for CodeQualityMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::CodeQuality
    }

    async fn evaluate(&self, ctx: &MetricContext) -> Result<MetricValue> {
        let Some(code) = ctx.target.code.as_ref() else {
            return Ok(MetricValue::Score(0.0));
        };
        if !code.host.is_code_host() {
            debug!("{} is not a supported code host", code.host.domain());
            return Ok(MetricValue::Score(0.0));
        }

        let analysis = ctx.collaborators.analyzer.analyze(code).await?;
        Ok(MetricValue::Score(code_quality_score(analysis, &ctx.config.code_quality)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ModelTarget;
    use crate::test_support::{collaborators, context, MockAnalyzer, MockHost};
    use std::sync::Arc;

    fn analysis(source_lines: u64, issue_count: u64) -> CodeAnalysis {
        CodeAnalysis {
            source_lines,
            issue_count,
        }
    }

    #[test]
    fn test_special_cases() {
        let policy = CodeQualityPolicy::default();
        assert_eq!(code_quality_score(analysis(0, 0), &policy), 0.5);
        assert_eq!(code_quality_score(analysis(1200, 0), &policy), 1.0);
    }

    #[test]
    fn test_small_codebases_penalized_harder() {
        let policy = CodeQualityPolicy::default();
        // Same 1% density: 400 lines uses x50, 30_000 lines uses x2.
        let small = code_quality_score(analysis(400, 4), &policy);
        let large = code_quality_score(analysis(30_000, 300), &policy);
        assert!((small - 0.5).abs() < 1e-12);
        assert!((large - 0.98).abs() < 1e-12);
        assert!(small < large);

        let medium = code_quality_score(analysis(4_000, 40), &policy);
        assert!(small < medium && medium < large);
    }

    #[test]
    fn test_clamped_at_zero() {
        let policy = CodeQualityPolicy::default();
        assert_eq!(code_quality_score(analysis(100, 500), &policy), 0.0);
    }

    async fn evaluate(code: Option<&str>, result: Option<CodeAnalysis>) -> Result<MetricValue> {
        let target = ModelTarget::parse("https://huggingface.co/org/model", None, code).unwrap();
        let mut collaborators = collaborators(MockHost::new());
        collaborators.analyzer = Arc::new(MockAnalyzer(result));
        CodeQualityMetric.evaluate(&context(target, collaborators)).await
    }

    #[tokio::test]
    async fn test_unsupported_or_missing_code_scores_zero() {
        let clean = Some(analysis(1000, 0));
        assert_eq!(evaluate(None, clean).await.unwrap(), MetricValue::Score(0.0));
        assert_eq!(
            evaluate(Some("https://codeberg.org/org/repo"), clean).await.unwrap(),
            MetricValue::Score(0.0)
        );
    }

    #[tokio::test]
    async fn test_analyzed_repository() {
        let value = evaluate(Some("https://github.com/org/repo"), Some(analysis(1000, 0))).await;
        assert_eq!(value.unwrap(), MetricValue::Score(1.0));
        assert!(evaluate(Some("https://github.com/org/repo"), None).await.is_err());
    }
}
