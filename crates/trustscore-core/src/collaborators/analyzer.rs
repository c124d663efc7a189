//! Static analysis via `git` and `flake8` subprocesses.
//!
//! The repository is shallow-cloned into a temporary directory, Python
//! source lines are counted with `walkdir`, and every line `flake8` prints
//! counts as one issue.

use super::{CodeAnalysis, CodeAnalyzer};
use crate::artifact::ArtifactRef;
use crate::config::NetworkConfig;
use crate::error::{Result, TrustScoreError};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;
use walkdir::WalkDir;

/// Extension of the analysed language's source files.
const SOURCE_EXTENSION: &str = "py";

/// Clones with `git` and lints with `flake8`.
#[derive(Debug, Clone)]
pub struct GitLintAnalyzer {
    git: String,
    linter: String,
}

impl GitLintAnalyzer {
    pub fn new() -> Self {
        Self {
            git: "git".to_string(),
            linter: "flake8".to_string(),
        }
    }

    async fn clone_into(&self, url: &str, dest: &Path) -> Result<()> {
        let child = Command::new(&self.git)
            .args(["clone", "--depth", "1", "--single-branch", "--quiet", url])
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TrustScoreError::Execution {
                message: format!("Failed to spawn {}: {e}", self.git),
            })?;

        let output = tokio::time::timeout(NetworkConfig::ANALYSIS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| TrustScoreError::Timeout(NetworkConfig::ANALYSIS_TIMEOUT))?
            .map_err(|e| TrustScoreError::Execution {
                message: format!("git clone process error: {e}"),
            })?;

        if !output.status.success() {
            return Err(TrustScoreError::Execution {
                message: format!(
                    "git clone of {} exited with status: {}",
                    url,
                    output.status.code().unwrap_or(-1)
                ),
            });
        }
        Ok(())
    }

    async fn count_issues(&self, root: &Path) -> Result<u64> {
        let child = Command::new(&self.linter)
            .arg("--exit-zero")
            .arg(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TrustScoreError::Execution {
                message: format!("Failed to spawn {}: {e}", self.linter),
            })?;

        let output = tokio::time::timeout(NetworkConfig::ANALYSIS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| TrustScoreError::Timeout(NetworkConfig::ANALYSIS_TIMEOUT))?
            .map_err(|e| TrustScoreError::Execution {
                message: format!("{} process error: {e}", self.linter),
            })?;

        Ok(count_report_lines(&output.stdout))
    }
}

impl Default for GitLintAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Total lines across every source file under `root`, skipping `.git`.
pub(crate) fn count_source_lines(root: &Path) -> u64 {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == SOURCE_EXTENSION))
        .filter_map(|e| std::fs::read(e.path()).ok())
        .map(|bytes| line_count(&bytes))
        .sum()
}

fn line_count(bytes: &[u8]) -> u64 {
    let newlines = bytes.iter().filter(|b| **b == b'\n').count() as u64;
    let unterminated = !bytes.is_empty() && !bytes.ends_with(b"\n");
    newlines + u64::from(unterminated)
}

fn count_report_lines(stdout: &[u8]) -> u64 {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .count() as u64
}

#[async_trait]
impl CodeAnalyzer for GitLintAnalyzer {
    async fn analyze(&self, code: &ArtifactRef) -> Result<CodeAnalysis> {
        if !code.host.is_code_host() {
            return Err(TrustScoreError::UnsupportedHost {
                host: code.host.domain().to_string(),
            });
        }

        let workdir = TempDir::new()?;
        let checkout = workdir.path().join("repo");
        self.clone_into(&code.url, &checkout).await?;

        let root = checkout.clone();
        let source_lines = tokio::task::spawn_blocking(move || count_source_lines(&root))
            .await
            .map_err(|e| TrustScoreError::Other(format!("line counting task failed: {e}")))?;

        let issue_count = if source_lines == 0 {
            0
        } else {
            self.count_issues(&checkout).await?
        };

        debug!(
            "{}: {} source lines, {} lint issues",
            code.repo_id(),
            source_lines,
            issue_count
        );
        Ok(CodeAnalysis {
            source_lines,
            issue_count,
        })
    }
}
