//! HuggingFace Hub implementation of [`ArtifactHost`].
//!
//! Uses the public Hub HTTP API:
//! - `GET /api/{models|datasets}/{repo_id}?blobs=true` for metadata and file sizes
//! - `GET /{repo_id}/resolve/main/{file}` for raw file contents
//! - `GET /api/models/{repo_id}/commits/main` for commit history

use super::{ArtifactHost, CommitRecord, RepoFile, RepoManifest};
use crate::artifact::{ArtifactKind, ArtifactRef, Host};
use crate::config::HubConfig;
use crate::error::{Result, TrustScoreError};
use crate::network::{retry_async, HttpClient, RetryConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Model or dataset info as returned by the Hub API.
#[derive(Debug, Deserialize)]
struct HubRepoInfo {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    downloads: Option<u64>,
    #[serde(default)]
    likes: Option<u64>,
    #[serde(default, rename = "cardData")]
    card_data: Option<HubCardData>,
    #[serde(default)]
    siblings: Vec<HubSibling>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HubCardData {
    #[serde(default)]
    license: Option<LicenseField>,
}

/// `cardData.license` is either one identifier or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LicenseField {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct HubSibling {
    rfilename: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct HubCommit {
    #[serde(default)]
    authors: Vec<HubCommitAuthor>,
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct HubCommitAuthor {
    user: String,
}

impl HubRepoInfo {
    fn into_manifest(self, fallback_id: &str) -> RepoManifest {
        let mut declared_licenses: Vec<String> = match self.card_data.and_then(|c| c.license) {
            Some(LicenseField::One(license)) => vec![license],
            Some(LicenseField::Many(licenses)) => licenses,
            None => Vec::new(),
        };
        declared_licenses.extend(
            self.tags
                .iter()
                .filter_map(|t| t.strip_prefix("license:"))
                .map(str::to_string),
        );
        for license in declared_licenses.iter_mut() {
            *license = license.trim().to_lowercase();
        }
        declared_licenses.sort();
        declared_licenses.dedup();

        RepoManifest {
            id: self.id.unwrap_or_else(|| fallback_id.to_string()),
            downloads: self.downloads,
            likes: self.likes,
            declared_licenses,
            files: self
                .siblings
                .into_iter()
                .map(|s| RepoFile {
                    path: s.rfilename,
                    size: s.size,
                })
                .collect(),
            tags: self.tags,
        }
    }
}

/// Client for the HuggingFace Hub.
pub struct HubClient {
    http: Arc<HttpClient>,
    token: Option<String>,
    retry: RetryConfig,
}

impl HubClient {
    /// Create a client, optionally authenticated with a Hub token.
    pub fn new(token: Option<String>) -> Result<Self> {
        Ok(Self {
            http: Arc::new(HttpClient::new()?),
            token,
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn repo_path(artifact: &ArtifactRef) -> Result<String> {
        if artifact.host != Host::HuggingFace {
            return Err(TrustScoreError::UnsupportedHost {
                host: artifact.host.domain().to_string(),
            });
        }
        Ok(match artifact.kind {
            ArtifactKind::Dataset => format!("datasets/{}", artifact.repo_id()),
            _ => format!("models/{}", artifact.repo_id()),
        })
    }

    fn file_url(artifact: &ArtifactRef, filename: &str) -> String {
        let prefix = if artifact.kind == ArtifactKind::Dataset { "datasets/" } else { "" };
        let path = filename
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/{}{}/resolve/{}/{}",
            HubConfig::HUB_BASE,
            prefix,
            artifact.repo_id(),
            HubConfig::DEFAULT_REVISION,
            path
        )
    }

    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let auth = self.auth_header();
        retry_async(&self.retry, url, || {
            let http = self.http.clone();
            let auth = auth.clone();
            async move {
                let headers: Vec<(&str, &str)> = auth
                    .as_deref()
                    .map(|a| vec![("Authorization", a)])
                    .unwrap_or_default();
                http.get_json::<T>(url, &headers).await
            }
        })
        .await
    }
}

#[async_trait]
impl ArtifactHost for HubClient {
    async fn fetch_manifest(&self, artifact: &ArtifactRef) -> Result<RepoManifest> {
        let url = format!("{}/{}?blobs=true", HubConfig::API_BASE, Self::repo_path(artifact)?);
        let info: HubRepoInfo = self.get_json(&url).await?;
        let manifest = info.into_manifest(&artifact.repo_id());
        debug!(
            "Fetched manifest for {}: {} files, {} bytes",
            manifest.id,
            manifest.files.len(),
            manifest.total_size()
        );
        Ok(manifest)
    }

    async fn fetch_text_file(&self, artifact: &ArtifactRef, filename: &str) -> Result<String> {
        Self::repo_path(artifact)?;
        let url = Self::file_url(artifact, filename);
        let auth = self.auth_header();
        retry_async(&self.retry, &url, || {
            let http = self.http.clone();
            let auth = auth.clone();
            let url = url.clone();
            async move {
                let headers: Vec<(&str, &str)> = auth
                    .as_deref()
                    .map(|a| vec![("Authorization", a)])
                    .unwrap_or_default();
                http.get_text(&url, &headers).await
            }
        })
        .await
    }

    async fn fetch_commit_history(
        &self,
        artifact: &ArtifactRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>> {
        let base = format!(
            "{}/{}/commits/{}",
            HubConfig::API_BASE,
            Self::repo_path(artifact)?,
            HubConfig::DEFAULT_REVISION
        );

        let mut records = Vec::new();
        for page in 0..HubConfig::MAX_COMMIT_PAGES {
            let url = format!("{}?p={}", base, page);
            let commits: Vec<HubCommit> = self.get_json(&url).await?;
            if commits.is_empty() {
                break;
            }

            // Newest first: stop once a page reaches past the window.
            let reached_window_start = commits.iter().any(|c| c.date < since);
            records.extend(commits.into_iter().filter(|c| c.date >= since).map(|c| CommitRecord {
                author: c
                    .authors
                    .first()
                    .map(|a| a.user.clone())
                    .unwrap_or_else(|| "unknown".to_string()),
                timestamp: c.date,
            }));
            if reached_window_start {
                break;
            }
        }

        debug!("Fetched {} windowed commits for {}", records.len(), artifact.repo_id());
        Ok(records)
    }
}
