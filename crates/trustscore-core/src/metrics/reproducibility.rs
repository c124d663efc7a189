//! Reproducibility: does the card's demo code run?

use super::{Metric, MetricContext, MetricKind, MetricValue};
use crate::card::demo_code_blocks;
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

/// Score for demo code that ran but failed or timed out.
const PARTIAL_CREDIT: f64 = 0.5;

/// Runs the first interactive-session demo from the model card.
///
/// Exit status zero scores 1.0; a failure, timeout or sandbox error scores
/// 0.5; no runnable demo (or no card) scores 0.0.
pub struct ReproducibilityMetric;

#[async_trait]
impl Metric for ReproducibilityMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Reproducibility
    }

    async fn evaluate(&self, ctx: &MetricContext) -> Result<MetricValue> {
        let card = ctx.model_card().await?;
        let Some(demo) = demo_code_blocks(&card).into_iter().next() else {
            debug!("No runnable demo in card of {}", ctx.target.model.repo_id());
            return Ok(MetricValue::Score(0.0));
        };

        let timeout = ctx.config.reproducibility_timeout();
        let score = match ctx.collaborators.sandbox.run_isolated(&demo, timeout).await {
            Ok(outcome) if outcome.succeeded() => 1.0,
            Ok(outcome) => {
                debug!("Demo failed: {:?}", outcome);
                PARTIAL_CREDIT
            }
            Err(e) => {
                debug!("Demo could not run: {}", e);
                PARTIAL_CREDIT
            }
        };
        Ok(MetricValue::Score(score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::ExecutionOutcome;
    use crate::test_support::{collaborators, context, hub_model, MockHost, MockSandbox};
    use std::sync::Arc;

    const CARD: &str = "# Usage\n```python\n>>> import torch\n>>> print(torch.ones(2))\n```\n";

    async fn score(card: Option<&str>, sandbox: MockSandbox) -> (MetricValue, Vec<String>) {
        let mut host = MockHost::new();
        if let Some(card) = card {
            host = host.with_file("org/model", "README.md", card);
        }
        let sandbox = Arc::new(sandbox);
        let mut collaborators = collaborators(host);
        collaborators.sandbox = sandbox.clone();
        let value = ReproducibilityMetric
            .evaluate(&context(hub_model("org/model"), collaborators))
            .await
            .unwrap_or(MetricValue::Score(0.0));
        let runs = sandbox.runs.lock().unwrap().clone();
        (value, runs)
    }

    #[tokio::test]
    async fn test_successful_demo() {
        let (value, runs) = score(Some(CARD), MockSandbox::exiting(0)).await;
        assert_eq!(value, MetricValue::Score(1.0));
        assert_eq!(runs, vec!["import torch\nprint(torch.ones(2))".to_string()]);
    }

    #[tokio::test]
    async fn test_failures_get_partial_credit() {
        let (failed, _) = score(Some(CARD), MockSandbox::exiting(1)).await;
        assert_eq!(failed, MetricValue::Score(0.5));

        let timed_out = MockSandbox::with_outcome(Some(ExecutionOutcome {
            exit_code: None,
            timed_out: true,
        }));
        assert_eq!(score(Some(CARD), timed_out).await.0, MetricValue::Score(0.5));

        let broken = MockSandbox::with_outcome(None);
        assert_eq!(score(Some(CARD), broken).await.0, MetricValue::Score(0.5));
    }

    #[tokio::test]
    async fn test_no_demo_scores_zero() {
        let (value, runs) = score(Some("# Usage\n```python\nimport torch\n```\n"), MockSandbox::exiting(0)).await;
        assert_eq!(value, MetricValue::Score(0.0));
        assert!(runs.is_empty());

        assert_eq!(score(None, MockSandbox::exiting(0)).await.0, MetricValue::Score(0.0));
    }
}
