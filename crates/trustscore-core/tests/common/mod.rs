//! Shared in-memory collaborators for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use trustscore_core::collaborators::{ChangedFile, Review};
use trustscore_core::{
    ArtifactCatalog, ArtifactHost, ArtifactRef, CodeAnalysis, CodeAnalyzer, Collaborators,
    CommitRecord, CompletionClient, Credentials, ExecutionOutcome, KnownArtifact, Metric,
    MetricContext, MetricKind, MetricValue, RepoFile, RepoManifest, Result, ReviewHost,
    ReviewRequest, Sandbox, StaticCatalog, TrustScoreError,
};

pub const MODEL_URL: &str = "https://huggingface.co/acme/tiny-bert";
pub const DATASET_URL: &str = "https://huggingface.co/datasets/acme/corpus";
pub const CODE_URL: &str = "https://github.com/acme/tiny-bert";

pub const CARD: &str = "# Tiny BERT\n\
## Usage\n\
```python\n\
>>> from transformers import pipeline\n\
>>> fill = pipeline('fill-mask', model='acme/tiny-bert')\n\
```\n\
## Training Data\n\
Pretrained on the acme corpus of 3B tokens, deduplicated and filtered.\n\
## Evaluation\n\
GLUE average 79.1.\n\
## License\n\
MIT\n";

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn not_found(resource: impl Into<String>) -> TrustScoreError {
    TrustScoreError::NotFound {
        resource: resource.into(),
    }
}

/// Hub double keyed by repository id.
#[derive(Default, Clone)]
pub struct ScriptedHost {
    manifests: HashMap<String, RepoManifest>,
    files: HashMap<(String, String), String>,
    commits: HashMap<String, Vec<CommitRecord>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manifest(mut self, repo_id: &str, manifest: RepoManifest) -> Self {
        self.manifests.insert(repo_id.to_string(), manifest);
        self
    }

    pub fn file(mut self, repo_id: &str, filename: &str, content: &str) -> Self {
        self.files
            .insert((repo_id.to_string(), filename.to_string()), content.to_string());
        self
    }

    pub fn commits(mut self, repo_id: &str, commits: Vec<CommitRecord>) -> Self {
        self.commits.insert(repo_id.to_string(), commits);
        self
    }
}

#[async_trait]
impl ArtifactHost for ScriptedHost {
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

/// Replies with the same text to every prompt.
pub struct ConstCompletion(pub &'static str);

#[async_trait]
impl CompletionClient for ConstCompletion {
    async fn complete(&self, _prompt: &str, _credentials: &Credentials) -> Result<String> {
        Ok(self.0.to_string())
    }
}

pub struct ExitSandbox(pub i32);

#[async_trait]
impl Sandbox for ExitSandbox {
    async fn run_isolated(&self, _code: &str, _timeout: Duration) -> Result<ExecutionOutcome> {
        Ok(ExecutionOutcome {
            exit_code: Some(self.0),
            timed_out: false,
        })
    }
}

pub struct FixedReviews(pub Vec<ReviewRequest>);

#[async_trait]
impl ReviewHost for FixedReviews {
    async fn fetch_review_requests(&self, _code: &ArtifactRef) -> Result<Vec<ReviewRequest>> {
        Ok(self.0.clone())
    }
}

pub struct FixedAnalysis(pub CodeAnalysis);

#[async_trait]
impl CodeAnalyzer for FixedAnalysis {
    async fn analyze(&self, _code: &ArtifactRef) -> Result<CodeAnalysis> {
        Ok(self.0)
    }
}

pub fn collaborators(host: ScriptedHost, completion: &'static str) -> Collaborators {
    with_catalog(host, completion, StaticCatalog::empty())
}

pub fn with_catalog(
    host: ScriptedHost,
    completion: &'static str,
    catalog: impl ArtifactCatalog + 'static,
) -> Collaborators {
    Collaborators {
        host: Arc::new(host),
        reviews: Arc::new(FixedReviews(vec![approved_request(1, &[("src/model.py", 120)])])),
        completion: Arc::new(ConstCompletion(completion)),
        sandbox: Arc::new(ExitSandbox(0)),
        analyzer: Arc::new(FixedAnalysis(CodeAnalysis {
            source_lines: 2_000,
            issue_count: 0,
        })),
        catalog: Arc::new(catalog),
    }
}

/// `per_author` commits for each author, spread over the last 100 days.
pub fn commits(authors: &[&str], per_author: usize) -> Vec<CommitRecord> {
    let now = Utc::now();
    authors
        .iter()
        .flat_map(|author| {
            (0..per_author).map(move |i| CommitRecord {
                author: author.to_string(),
                timestamp: now - ChronoDuration::days((i % 100) as i64),
            })
        })
        .collect()
}

pub fn approved_request(number: u64, files: &[(&str, u64)]) -> ReviewRequest {
    ReviewRequest {
        number,
        merged_at: Some(Utc::now()),
        changed_files: files
            .iter()
            .map(|(path, added_lines)| ChangedFile {
                path: path.to_string(),
                added_lines: *added_lines,
            })
            .collect(),
        reviews: vec![Review {
            state: "APPROVED".into(),
        }],
    }
}

pub fn small_manifest(id: &str, license: &str) -> RepoManifest {
    RepoManifest {
        id: id.to_string(),
        downloads: Some(100_000),
        likes: Some(1_000),
        declared_licenses: vec![license.to_string()],
        files: vec![
            RepoFile {
                path: "model.safetensors".into(),
                size: Some(400 * 1024 * 1024),
            },
            RepoFile {
                path: "config.json".into(),
                size: Some(700),
            },
        ],
        tags: vec![],
    }
}

/// The fully-documented model of the end-to-end scenario.
pub fn healthy_host() -> ScriptedHost {
    ScriptedHost::new()
        .manifest("acme/tiny-bert", small_manifest("acme/tiny-bert", "mit"))
        .manifest(
            "acme/corpus",
            RepoManifest {
                id: "acme/corpus".into(),
                downloads: Some(1_000_000),
                likes: Some(10_000),
                ..Default::default()
            },
        )
        .file("acme/tiny-bert", "README.md", CARD)
        .file("acme/tiny-bert", "config.json", r#"{"model_type": "bert"}"#)
        .commits("acme/tiny-bert", commits(&["ana", "ben", "cho", "dev", "eli"], 20))
}

/// A metric that sleeps, then reports a fixed score.
pub struct SleepyMetric {
    pub kind: MetricKind,
    pub delay: Duration,
    pub score: f64,
}

#[async_trait]
impl Metric for SleepyMetric {
    fn kind(&self) -> MetricKind {
        self.kind
    }

    async fn evaluate(&self, _ctx: &MetricContext) -> Result<MetricValue> {
        tokio::time::sleep(self.delay).await;
        Ok(MetricValue::Score(self.score))
    }
}

/// Sleeps, then counts how many bodies ran to completion.
pub struct CountingMetric {
    pub kind: MetricKind,
    pub delay: Duration,
    pub finished: Arc<AtomicUsize>,
}

#[async_trait]
impl Metric for CountingMetric {
    fn kind(&self) -> MetricKind {
        self.kind
    }

    async fn evaluate(&self, _ctx: &MetricContext) -> Result<MetricValue> {
        tokio::time::sleep(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(MetricValue::Score(1.0))
    }
}

pub struct PanickingMetric(pub MetricKind);

#[async_trait]
impl Metric for PanickingMetric {
    fn kind(&self) -> MetricKind {
        self.0
    }

    async fn evaluate(&self, _ctx: &MetricContext) -> Result<MetricValue> {
        panic!("judgment function blew up");
    }
}

pub struct FailingMetric(pub MetricKind);

#[async_trait]
impl Metric for FailingMetric {
    fn kind(&self) -> MetricKind {
        self.0
    }

    async fn evaluate(&self, _ctx: &MetricContext) -> Result<MetricValue> {
        Err(TrustScoreError::Network {
            message: "connection reset".into(),
            cause: None,
        })
    }
}

pub fn known_model(id: &str, name: &str, repo_id: &str) -> KnownArtifact {
    KnownArtifact::new(id, name, trustscore_core::ArtifactKind::Model)
        .with_url(format!("https://huggingface.co/{}", repo_id))
}
