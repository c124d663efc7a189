//! Performance-claim documentation.

use super::{Metric, MetricContext, MetricKind, MetricValue};
use crate::card::truncate_chars;
use crate::error::Result;
use async_trait::async_trait;

pub struct PerformanceClaimsMetric;

fn performance_prompt(url: &str, card: &str) -> String {
    format!(
        "Assess the performance documentation for the model located at {url}. \
         Provide a score between 0 (no documentation) and 1 (clear, detailed documentation). \
         Performance documentation means evaluation results, benchmarks or metrics reported in the README, \
         usually as tables or charts under sections like 'Evaluation', 'Results' or 'Benchmarks'. \
         Provide only the numeric score as output, without any additional text or explanation.\
         \n\nModel README:\n```\n{card}\n```"
    )
}

#[async_trait]
impl Metric for PerformanceClaimsMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::PerformanceClaims
    }

    async fn evaluate(&self, ctx: &MetricContext) -> Result<MetricValue> {
        let card = ctx.model_card().await.unwrap_or_default();
        let prompt = performance_prompt(
            &ctx.target.model.url,
            truncate_chars(&card, ctx.config.max_prompt_chars),
        );
        let score = ctx.ask_for_score(&prompt).await?;
        Ok(MetricValue::Score(score))
    }
}
