//! Tree score: mean composite score of a model's immediate parents.

use super::{clamp_unit, Metric, MetricContext, MetricKind, MetricValue};
use crate::artifact::{ArtifactKind, ArtifactRef};
use crate::error::Result;
use crate::lineage::{known_or_synthetic, LineageResolver, Relationship};
use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

/// Parents are scored by a nested evaluation whose own tree score is
/// disabled through the [`LineageScope`](crate::engine::LineageScope)
/// recursion budget.
pub struct TreeScoreMetric;

/// Mean of the parent scores that fall inside `[0, 1]`; zero when none do.
pub fn mean_parent_score(scores: &[f64]) -> f64 {
    let valid: Vec<f64> = scores.iter().copied().filter(|s| (0.0..=1.0).contains(s)).collect();
    if valid.is_empty() {
        return 0.0;
    }
    clamp_unit(valid.iter().sum::<f64>() / valid.len() as f64)
}

#[async_trait]
impl Metric for TreeScoreMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::TreeScore
    }

    async fn evaluate(&self, ctx: &MetricContext) -> Result<MetricValue> {
        if !ctx.scope.tree_score_enabled() {
            return Ok(MetricValue::Score(0.0));
        }

        let known = ctx.collaborators.catalog.known_artifacts().await?;
        let root = known_or_synthetic(&ctx.target.model, &known);
        let resolver = LineageResolver::new(ctx.collaborators.host.clone(), ctx.config.lineage.clone());
        let graph = resolver.build_ancestry(&root, &known).await?;

        let parents: Vec<ArtifactRef> = graph
            .parents(&graph.root)
            .into_iter()
            .filter(|edge| edge.relationship == Relationship::BaseModel)
            .filter_map(|edge| graph.node(&edge.from).and_then(|n| n.reference()))
            .filter(|r| r.kind == ArtifactKind::Model && r.url != ctx.target.model.url)
            .filter(|r| !ctx.scope.has_visited(r))
            .take(ctx.config.lineage.max_parents)
            .collect();
        if parents.is_empty() {
            debug!("{} has no scorable parents", ctx.target.model.repo_id());
            return Ok(MetricValue::Score(0.0));
        }

        let scope = ctx.scope.child(&ctx.target.model);
        let outcomes = join_all(
            parents
                .iter()
                .map(|parent| ctx.parents.parent_net_score(parent, &ctx.credentials, &scope)),
        )
        .await;

        let scores: Vec<f64> = parents
            .iter()
            .zip(outcomes)
            .filter_map(|(parent, outcome)| match outcome {
                Ok(score) => Some(score),
                Err(e) => {
                    debug!("Parent {} could not be scored: {}", parent.repo_id(), e);
                    None
                }
            })
            .collect();
        Ok(MetricValue::Score(mean_parent_score(&scores)))
    }
}
