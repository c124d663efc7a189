//! In-memory collaborators for unit tests.

use crate::artifact::{ArtifactRef, ModelTarget};
use crate::collaborators::{
    ArtifactHost, CodeAnalysis, CodeAnalyzer, Collaborators, CommitRecord, CompletionClient,
    Credentials, ExecutionOutcome, RepoManifest, ReviewHost, ReviewRequest, Sandbox, StaticCatalog,
};
use crate::config::ScoringConfig;
use crate::engine::{LineageScope, ParentScorer};
use crate::error::{Result, TrustScoreError};
use crate::metrics::MetricContext;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn not_found(resource: impl Into<String>) -> TrustScoreError {
    TrustScoreError::NotFound {
        resource: resource.into(),
    }
}

/// Hub double keyed by repository id.
#[derive(Default)]
pub struct MockHost {
    manifests: HashMap<String, RepoManifest>,
    files: HashMap<(String, String), String>,
    commits: HashMap<String, Vec<CommitRecord>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_manifest(mut self, repo_id: &str, manifest: RepoManifest) -> Self {
        self.manifests.insert(repo_id.to_string(), manifest);
        self
    }

    pub fn with_file(mut self, repo_id: &str, filename: &str, content: &str) -> Self {
        self.files
            .insert((repo_id.to_string(), filename.to_string()), content.to_string());
        self
    }

    pub fn with_commits(mut self, repo_id: &str, commits: Vec<CommitRecord>) -> Self {
        self.commits.insert(repo_id.to_string(), commits);
        self
    }
}

#[async_trait]
impl ArtifactHost for MockHost {
    async fn fetch_manifest(&self, artifact: &ArtifactRef) -> Result<RepoManifest> {
        self.manifests
            .get(&artifact.repo_id())
            .cloned()
            .ok_or_else(|| not_found(artifact.repo_id()))
    }

    async fn fetch_text_file(&self, artifact: &ArtifactRef, filename: &str) -> Result<String> {
        self.files
            .get(&(artifact.repo_id(), filename.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("{}/{}", artifact.repo_id(), filename)))
    }

    async fn fetch_commit_history(
        &self,
        artifact: &ArtifactRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>> {
        let commits = self
            .commits
            .get(&artifact.repo_id())
            .ok_or_else(|| not_found(artifact.repo_id()))?;
        Ok(commits.iter().filter(|c| c.timestamp >= since).cloned().collect())
    }
}

/// Always returns the same reply; `None` fails every call.
pub struct FixedCompletion(pub Option<String>);

#[async_trait]
impl CompletionClient for FixedCompletion {
    async fn complete(&self, _prompt: &str, _credentials: &Credentials) -> Result<String> {
        self.0.clone().ok_or_else(|| TrustScoreError::Completion {
            message: "no reply".into(),
        })
    }
}

/// Records the code it is asked to run and reports a fixed outcome.
pub struct MockSandbox {
    outcome: Option<ExecutionOutcome>,
    pub runs: Mutex<Vec<String>>,
}

impl MockSandbox {
    pub fn exiting(code: i32) -> Self {
        Self::with_outcome(Some(ExecutionOutcome {
            exit_code: Some(code),
            timed_out: false,
        }))
    }

    pub fn with_outcome(outcome: Option<ExecutionOutcome>) -> Self {
        Self {
            outcome,
            runs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Sandbox for MockSandbox {
    async fn run_isolated(&self, code: &str, _timeout: Duration) -> Result<ExecutionOutcome> {
        self.runs.lock().unwrap().push(code.to_string());
        self.outcome.ok_or_else(|| TrustScoreError::Execution {
            message: "sandbox unavailable".into(),
        })
    }
}

pub struct MockReviews(pub Vec<ReviewRequest>);

#[async_trait]
impl ReviewHost for MockReviews {
    async fn fetch_review_requests(&self, _code: &ArtifactRef) -> Result<Vec<ReviewRequest>> {
        Ok(self.0.clone())
    }
}

pub struct MockAnalyzer(pub Option<CodeAnalysis>);

#[async_trait]
impl CodeAnalyzer for MockAnalyzer {
    async fn analyze(&self, code: &ArtifactRef) -> Result<CodeAnalysis> {
        self.0.ok_or_else(|| not_found(code.repo_id()))
    }
}

/// Parent scores keyed by repository id.
#[derive(Default)]
pub struct FixedParentScorer {
    scores: HashMap<String, f64>,
    pub seen_depths: Mutex<Vec<u32>>,
}

impl FixedParentScorer {
    pub fn new(scores: &[(&str, f64)]) -> Self {
        Self {
            scores: scores.iter().map(|(id, s)| (id.to_string(), *s)).collect(),
            seen_depths: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ParentScorer for FixedParentScorer {
    async fn parent_net_score(
        &self,
        parent: &ArtifactRef,
        _credentials: &Credentials,
        scope: &LineageScope,
    ) -> Result<f64> {
        self.seen_depths.lock().unwrap().push(scope.depth());
        self.scores
            .get(&parent.repo_id())
            .copied()
            .ok_or_else(|| not_found(parent.repo_id()))
    }
}

/// Collaborators around `host` with neutral defaults for everything else.
pub fn collaborators(host: MockHost) -> Collaborators {
    Collaborators {
        host: Arc::new(host),
        reviews: Arc::new(MockReviews(Vec::new())),
        completion: Arc::new(FixedCompletion(Some("0.5".into()))),
        sandbox: Arc::new(MockSandbox::exiting(0)),
        analyzer: Arc::new(MockAnalyzer(None)),
        catalog: Arc::new(StaticCatalog::empty()),
    }
}

pub fn hub_model(repo_id: &str) -> ModelTarget {
    ModelTarget::parse(&format!("https://huggingface.co/{}", repo_id), None, None).unwrap()
}

pub fn context(target: ModelTarget, collaborators: Collaborators) -> MetricContext {
    MetricContext {
        target,
        credentials: Credentials::anonymous(),
        collaborators,
        config: Arc::new(ScoringConfig::default()),
        scope: LineageScope::root(1),
        parents: Arc::new(FixedParentScorer::default()),
        started_at: Utc::now(),
    }
}
