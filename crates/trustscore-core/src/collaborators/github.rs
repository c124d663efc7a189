//! GitHub implementation of [`ReviewHost`].
//!
//! Provides:
//! - Paginated closed pull requests (`Link: rel="next"`)
//! - Per-request reviews and changed files, fetched with bounded concurrency
//! - Rate limit handling through the shared [`HttpClient`]

use super::{ChangedFile, Review, ReviewHost, ReviewRequest};
use crate::artifact::{ArtifactRef, Host};
use crate::config::GitHubConfig;
use crate::error::{Result, TrustScoreError};
use crate::network::{has_next_page, retry_async, HttpClient, RetryConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct GhPull {
    number: u64,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GhReview {
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GhFile {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    additions: u64,
}

/// GitHub REST API client for review history.
pub struct GitHubClient {
    http: Arc<HttpClient>,
    token: Option<String>,
    retry: RetryConfig,
}

impl GitHubClient {
    /// Create a client, optionally authenticated with a personal access token.
    pub fn new(token: Option<String>) -> Result<Self> {
        Ok(Self {
            http: Arc::new(HttpClient::new()?),
            token,
            retry: RetryConfig::new()
                .with_max_attempts(3)
                .with_base_delay(Duration::from_secs(2)),
        })
    }

    fn repo_base(code: &ArtifactRef) -> Result<String> {
        if code.host != Host::GitHub {
            return Err(TrustScoreError::UnsupportedHost {
                host: code.host.domain().to_string(),
            });
        }
        let owner = code.namespace.as_deref().ok_or_else(|| {
            TrustScoreError::invalid_reference(&code.url, "GitHub repository has no owner")
        })?;
        Ok(format!("{}/repos/{}/{}", GitHubConfig::API_BASE, owner, code.name))
    }

    /// GET one page, returning the decoded body and whether another page follows.
    async fn get_page<T: DeserializeOwned>(&self, url: &str) -> Result<(T, bool)> {
        let auth = self.token.as_ref().map(|t| format!("Bearer {}", t));
        retry_async(&self.retry, url, || {
            let http = self.http.clone();
            let auth = auth.clone();
            async move {
                let mut headers = vec![("Accept", "application/vnd.github+json")];
                if let Some(auth) = auth.as_deref() {
                    headers.push(("Authorization", auth));
                }
                let response = http.get(url, &headers).await?;
                let more = has_next_page(&response);
                let body = response.json::<T>().await.map_err(|e| TrustScoreError::Json {
                    message: format!("Failed to parse GitHub response: {}", e),
                    source: None,
                })?;
                Ok((body, more))
            }
        })
        .await
    }

    async fn merged_pulls(&self, base: &str) -> Result<Vec<(u64, DateTime<Utc>)>> {
        let mut merged = Vec::new();
        for page in 1..=GitHubConfig::MAX_PAGES {
            let url = format!(
                "{}/pulls?state=closed&sort=updated&direction=desc&per_page={}&page={}",
                base,
                GitHubConfig::PER_PAGE,
                page
            );
            let (pulls, more): (Vec<GhPull>, bool) = self.get_page(&url).await?;
            if pulls.is_empty() {
                break;
            }
            merged.extend(pulls.iter().filter_map(|p| p.merged_at.map(|at| (p.number, at))));
            if merged.len() >= GitHubConfig::MAX_MERGED_REQUESTS || !more {
                break;
            }
        }
        merged.truncate(GitHubConfig::MAX_MERGED_REQUESTS);
        Ok(merged)
    }

    async fn pull_details(&self, base: &str, number: u64) -> Result<(Vec<Review>, Vec<ChangedFile>)> {
        let reviews_url = format!("{}/pulls/{}/reviews?per_page={}", base, number, GitHubConfig::PER_PAGE);
        let (reviews, _): (Vec<GhReview>, bool) = self.get_page(&reviews_url).await?;

        let mut files = Vec::new();
        for page in 1..=GitHubConfig::MAX_PAGES {
            let url = format!(
                "{}/pulls/{}/files?per_page={}&page={}",
                base,
                number,
                GitHubConfig::PER_PAGE,
                page
            );
            let (batch, more): (Vec<GhFile>, bool) = self.get_page(&url).await?;
            let empty = batch.is_empty();
            files.extend(batch.into_iter().map(|f| ChangedFile {
                path: f.filename,
                added_lines: f.additions,
            }));
            if empty || !more {
                break;
            }
        }

        let reviews = reviews
            .into_iter()
            .map(|r| Review {
                state: r.state.unwrap_or_default(),
            })
            .collect();
        Ok((reviews, files))
    }
}

#[async_trait]
impl ReviewHost for GitHubClient {
    async fn fetch_review_requests(&self, code: &ArtifactRef) -> Result<Vec<ReviewRequest>> {
        let base = Self::repo_base(code)?;
        let merged = self.merged_pulls(&base).await?;
        debug!("{} merged pull requests in {}", merged.len(), code.repo_id());

        let base_ref = base.as_str();
        let mut requests: Vec<ReviewRequest> = stream::iter(merged)
            .map(|(number, merged_at)| async move {
                match self.pull_details(base_ref, number).await {
                    Ok((reviews, changed_files)) => Some(ReviewRequest {
                        number,
                        merged_at: Some(merged_at),
                        changed_files,
                        reviews,
                    }),
                    Err(e) => {
                        warn!("Skipping pull request #{} of {}: {}", number, code.repo_id(), e);
                        None
                    }
                }
            })
            .buffer_unordered(GitHubConfig::DETAIL_CONCURRENCY)
            .filter_map(|r| async move { r })
            .collect()
            .await;

        requests.sort_by_key(|r| r.number);
        info!("Fetched review details for {} pull requests of {}", requests.len(), code.repo_id());
        Ok(requests)
    }
}
