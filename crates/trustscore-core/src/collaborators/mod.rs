//! Collaborator interfaces consumed by the scoring engine.
//!
//! Each trait is one external capability: repository metadata, review
//! history, language-model completion, sandboxed execution, static analysis
//! and the artifact registry. Judgment functions only ever see these traits,
//! so tests substitute in-memory implementations.

mod analyzer;
mod auth;
mod catalog;
mod completion;
mod github;
mod hub;
mod sandbox;

pub use analyzer::GitLintAnalyzer;
pub use auth::{resolve_github_token, resolve_hf_token, Credentials};
pub use catalog::{RegistryFileCatalog, StaticCatalog};
pub use completion::ChatCompletionClient;
pub use github::GitHubClient;
pub use hub::HubClient;
pub use sandbox::PythonSandbox;

use crate::artifact::{ArtifactRef, KnownArtifact};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Repository metadata returned by [`ArtifactHost::fetch_manifest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoManifest {
    pub id: String,
    /// `None` when the host did not report a count.
    pub downloads: Option<u64>,
    pub likes: Option<u64>,
    /// License identifiers declared in the repository metadata.
    pub declared_licenses: Vec<String>,
    pub files: Vec<RepoFile>,
    pub tags: Vec<String>,
}

impl RepoManifest {
    /// Sum of every file size the host reported.
    pub fn total_size(&self) -> u64 {
        self.files.iter().filter_map(|f| f.size).sum()
    }
}

/// One file in a repository listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoFile {
    pub path: String,
    pub size: Option<u64>,
}

/// One commit of a repository's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

/// A closed review request (pull request) and what it touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub number: u64,
    /// `None` for requests closed without merging.
    pub merged_at: Option<DateTime<Utc>>,
    pub changed_files: Vec<ChangedFile>,
    pub reviews: Vec<Review>,
}

impl ReviewRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    pub fn is_approved(&self) -> bool {
        self.reviews.iter().any(Review::is_approval)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
    pub added_lines: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Host review state, e.g. `APPROVED` or `COMMENTED`.
    pub state: String,
}

impl Review {
    pub fn is_approval(&self) -> bool {
        self.state.eq_ignore_ascii_case("approved")
    }
}

/// Result of running code in the sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// `None` when the process was killed or never reported a status.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Line and lint counts for a code repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeAnalysis {
    pub source_lines: u64,
    pub issue_count: u64,
}

/// Repository metadata and file host (the model hub).
#[async_trait]
pub trait ArtifactHost: Send + Sync {
    /// Repository metadata: file list with sizes, declared license, popularity counts.
    async fn fetch_manifest(&self, artifact: &ArtifactRef) -> Result<RepoManifest>;

    /// Raw contents of one file at the default revision.
    async fn fetch_text_file(&self, artifact: &ArtifactRef, filename: &str) -> Result<String>;

    /// Commits authored at or after `since`.
    async fn fetch_commit_history(
        &self,
        artifact: &ArtifactRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>>;
}

/// Code-review platform.
#[async_trait]
pub trait ReviewHost: Send + Sync {
    /// Closed review requests with their changed files and reviews.
    async fn fetch_review_requests(&self, code: &ArtifactRef) -> Result<Vec<ReviewRequest>>;
}

/// Single-turn language-model completion.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete `prompt`. An empty reply is an error.
    async fn complete(&self, prompt: &str, credentials: &Credentials) -> Result<String>;
}

/// Isolated, time-bounded code execution.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Run `code`; exceeding `timeout` is reported through [`ExecutionOutcome::timed_out`].
    async fn run_isolated(&self, code: &str, timeout: Duration) -> Result<ExecutionOutcome>;
}

/// Static analysis of a code repository.
#[async_trait]
pub trait CodeAnalyzer: Send + Sync {
    async fn analyze(&self, code: &ArtifactRef) -> Result<CodeAnalysis>;
}

/// The registry of every artifact known to the system.
#[async_trait]
pub trait ArtifactCatalog: Send + Sync {
    async fn known_artifacts(&self) -> Result<Vec<KnownArtifact>>;
}

/// The full set of collaborators handed to an engine.
#[derive(Clone)]
pub struct Collaborators {
    pub host: Arc<dyn ArtifactHost>,
    pub reviews: Arc<dyn ReviewHost>,
    pub completion: Arc<dyn CompletionClient>,
    pub sandbox: Arc<dyn Sandbox>,
    pub analyzer: Arc<dyn CodeAnalyzer>,
    pub catalog: Arc<dyn ArtifactCatalog>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

impl Collaborators {
    /// Network-backed collaborators with the given registry.
    ///
    /// Tokens are resolved once here; the completion endpoint and model can
    /// be overridden through the environment.
    pub fn live(catalog: Arc<dyn ArtifactCatalog>) -> Result<Self> {
        Ok(Self {
            host: Arc::new(HubClient::new(resolve_hf_token())?),
            reviews: Arc::new(GitHubClient::new(resolve_github_token())?),
            completion: Arc::new(ChatCompletionClient::from_env()?),
            sandbox: Arc::new(PythonSandbox::new()),
            analyzer: Arc::new(GitLintAnalyzer::new()),
            catalog,
        })
    }
}
