//! The scoring engine.
//!
//! One [`ScoringEngine::evaluate`] call fans every registered metric out onto
//! its own task, waits for all of them, and folds the results into a
//! [`ScoreRecord`]. Each metric is timed from just before its call to just
//! after it returns; a metric that errors, panics or overruns
//! [`ScoringConfig::metric_timeout`] is replaced by its safe default. The
//! only error `evaluate` itself returns is a bad model reference.

use crate::artifact::{ArtifactKind, ArtifactRef, ModelTarget};
use crate::collaborators::{Collaborators, Credentials};
use crate::config::ScoringConfig;
use crate::error::{Result, TrustScoreError};
use crate::lineage::{known_or_synthetic, LineageGraph, LineageResolver};
use crate::metrics::{default_metrics, Metric, MetricContext, MetricKind};
use crate::record::{MetricResult, ScoreRecord};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Recursion state threaded through nested (parent) evaluations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageScope {
    depth: u32,
    max_recursion: u32,
    visited: BTreeSet<String>,
}

impl LineageScope {
    /// Scope of a top-level evaluation.
    pub fn root(max_recursion: u32) -> Self {
        Self {
            depth: 0,
            max_recursion,
            visited: BTreeSet::new(),
        }
    }

    /// Scope for evaluating the parents of `current`.
    pub fn child(&self, current: &ArtifactRef) -> Self {
        let mut visited = self.visited.clone();
        visited.insert(current.url.clone());
        Self {
            depth: self.depth + 1,
            max_recursion: self.max_recursion,
            visited,
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Tree scoring is disabled once the recursion budget is spent.
    pub fn tree_score_enabled(&self) -> bool {
        self.depth < self.max_recursion
    }

    pub fn has_visited(&self, artifact: &ArtifactRef) -> bool {
        self.visited.contains(&artifact.url)
    }
}

/// Computes the composite score of a parent model.
#[async_trait]
pub trait ParentScorer: Send + Sync {
    async fn parent_net_score(
        &self,
        parent: &ArtifactRef,
        credentials: &Credentials,
        scope: &LineageScope,
    ) -> Result<f64>;
}

struct EngineInner {
    collaborators: Collaborators,
    config: Arc<ScoringConfig>,
    metrics: Vec<Arc<dyn Metric>>,
}

/// Concurrent trustworthiness scorer. Cheap to clone.
#[derive(Clone)]
pub struct ScoringEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for ScoringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringEngine")
            .field("metrics", &self.metric_kinds())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ScoringEngine`].
pub struct ScoringEngineBuilder {
    collaborators: Collaborators,
    config: ScoringConfig,
    metrics: Option<Vec<Arc<dyn Metric>>>,
}

impl ScoringEngineBuilder {
    pub fn config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the metric registry (defaults to every built-in metric).
    pub fn metrics(mut self, metrics: Vec<Arc<dyn Metric>>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate the configuration and registry and build the engine.
    pub fn build(self) -> Result<ScoringEngine> {
        self.config.validate()?;
        let metrics = self.metrics.unwrap_or_else(default_metrics);

        let mut seen = BTreeSet::new();
        if let Some(dup) = metrics.iter().map(|m| m.kind()).find(|k| !seen.insert(*k)) {
            return Err(TrustScoreError::Config {
                message: format!("metric {} registered twice", dup),
            });
        }

        Ok(ScoringEngine {
            inner: Arc::new(EngineInner {
                collaborators: self.collaborators,
                config: Arc::new(self.config),
                metrics,
            }),
        })
    }
}

impl ScoringEngine {
    pub fn builder(collaborators: Collaborators) -> ScoringEngineBuilder {
        ScoringEngineBuilder {
            collaborators,
            config: ScoringConfig::default(),
            metrics: None,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.inner.config
    }

    /// Registered metrics, in registration order.
    pub fn metric_kinds(&self) -> Vec<MetricKind> {
        self.inner.metrics.iter().map(|m| m.kind()).collect()
    }

    /// Evaluate a model and its linked dataset and code.
    pub async fn evaluate(&self, target: &ModelTarget, credentials: &Credentials) -> Result<ScoreRecord> {
        let scope = LineageScope::root(self.inner.config.lineage.max_recursion);
        self.evaluate_scoped(target, credentials, scope).await
    }

    /// Parse `model_url` and evaluate it with no dataset or code link.
    pub async fn evaluate_url(&self, model_url: &str, credentials: &Credentials) -> Result<ScoreRecord> {
        let target = ModelTarget::parse(model_url, None, None)?;
        self.evaluate(&target, credentials).await
    }

    /// Evaluate within an explicit lineage scope.
    pub async fn evaluate_scoped(
        &self,
        target: &ModelTarget,
        credentials: &Credentials,
        scope: LineageScope,
    ) -> Result<ScoreRecord> {
        if target.model.kind != ArtifactKind::Model {
            return Err(TrustScoreError::invalid_reference(
                &target.model.url,
                format!("only models are rated, got a {}", target.model.kind),
            ));
        }

        info!("Evaluating {} (depth {})", target.model.repo_id(), scope.depth());
        let started = Instant::now();
        let ctx = Arc::new(MetricContext {
            target: target.clone(),
            credentials: credentials.clone(),
            collaborators: self.inner.collaborators.clone(),
            config: Arc::clone(&self.inner.config),
            scope,
            parents: Arc::new(self.clone()),
            started_at: Utc::now(),
        });
        let timeout = self.inner.config.metric_timeout();

        let handles = self.inner.metrics.iter().map(|metric| {
            let metric = Arc::clone(metric);
            let ctx = Arc::clone(&ctx);
            MetricTask(tokio::spawn(async move { run_metric(metric.as_ref(), &ctx, timeout).await }))
        });
        let joined = join_all(handles).await;

        let mut results = BTreeMap::new();
        for (metric, outcome) in self.inner.metrics.iter().zip(joined) {
            let result = outcome.unwrap_or_else(|e| {
                warn!("Metric task {} did not complete: {}", metric.kind(), e);
                MetricResult {
                    value: metric.safe_default(&self.inner.config),
                    latency_ms: 0,
                }
            });
            results.insert(metric.kind(), result);
        }

        let record = ScoreRecord::new(
            target.model.name.clone(),
            target.model.kind.category(),
            results,
            &self.inner.config.weights,
        );
        info!(
            "Evaluated {}: net_score {:.3} in {:?} (metric time {} ms)",
            target.model.repo_id(),
            record.net_score,
            started.elapsed(),
            record.net_score_latency
        );
        Ok(record)
    }

    /// Lineage graph of `model` against the registry.
    pub async fn build_lineage(&self, model: &ArtifactRef) -> Result<LineageGraph> {
        let known = self.inner.collaborators.catalog.known_artifacts().await?;
        let root = known_or_synthetic(model, &known);
        LineageResolver::new(
            Arc::clone(&self.inner.collaborators.host),
            self.inner.config.lineage.clone(),
        )
        .build_lineage(&root, &known)
        .await
    }
}

#[async_trait]
impl ParentScorer for ScoringEngine {
    async fn parent_net_score(
        &self,
        parent: &ArtifactRef,
        credentials: &Credentials,
        scope: &LineageScope,
    ) -> Result<f64> {
        let target = ModelTarget::new(parent.clone());
        let record = self.evaluate_scoped(&target, credentials, scope.clone()).await?;
        Ok(record.net_score)
    }
}

/// A spawned metric that is aborted when dropped, so cancelling an
/// evaluation also stops its metrics.
struct MetricTask(JoinHandle<MetricResult>);

impl Future for MetricTask {
    type Output = std::result::Result<MetricResult, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl Drop for MetricTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run one metric with timing, a timeout and panic isolation.
async fn run_metric(metric: &dyn Metric, ctx: &MetricContext, timeout: Duration) -> MetricResult {
    let kind = metric.kind();
    let start = Instant::now();
    let outcome = tokio::time::timeout(timeout, AssertUnwindSafe(metric.evaluate(ctx)).catch_unwind()).await;
    let latency_ms = (start.elapsed().as_secs_f64() * 1000.0).round() as u64;

    let value = match outcome {
        Ok(Ok(Ok(value))) => value.clamped(),
        Ok(Ok(Err(e))) => {
            debug!("{} fell back to its default: {}", kind, e);
            metric.safe_default(&ctx.config)
        }
        Ok(Err(_)) => {
            warn!("{} panicked; using its default", kind);
            metric.safe_default(&ctx.config)
        }
        Err(_) => {
            warn!("{} timed out after {:?}; using its default", kind, timeout);
            metric.safe_default(&ctx.config)
        }
    };
    debug!("{} = {:?} in {} ms", kind, value, latency_ms);
    MetricResult { value, latency_ms }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(url: &str) -> ArtifactRef {
        ArtifactRef::parse(url).unwrap()
    }

    #[test]
    fn test_scope_disables_tree_score_after_budget() {
        let root = LineageScope::root(1);
        assert!(root.tree_score_enabled());

        let parent = reference("https://huggingface.co/org/child");
        let child = root.child(&parent);
        assert_eq!(child.depth(), 1);
        assert!(!child.tree_score_enabled());
        assert!(child.has_visited(&parent));
        assert!(!root.has_visited(&parent));
    }

    #[test]
    fn test_zero_budget_never_recurses() {
        assert!(!LineageScope::root(0).tree_score_enabled());
    }
}
