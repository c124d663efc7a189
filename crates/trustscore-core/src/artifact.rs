//! Artifact references.
//!
//! An [`ArtifactRef`] is a canonical URL plus the `(namespace, name)` pair
//! derived from it. References are parsed once at the start of an
//! evaluation and never mutated afterwards.

use crate::error::{Result, TrustScoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// The three kinds of artifact a registry can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Model,
    Dataset,
    Code,
}

impl ArtifactKind {
    /// Uppercase category label used in score records.
    pub fn category(&self) -> &'static str {
        match self {
            ArtifactKind::Model => "MODEL",
            ArtifactKind::Dataset => "DATASET",
            ArtifactKind::Code => "CODE",
        }
    }

    /// Parse a registry type label, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "model" => Some(ArtifactKind::Model),
            "dataset" => Some(ArtifactKind::Dataset),
            "code" => Some(ArtifactKind::Code),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category())
    }
}

/// Where an artifact is hosted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Host {
    HuggingFace,
    GitHub,
    GitLab,
    Bitbucket,
    Other(String),
}

impl Host {
    fn from_domain(domain: &str) -> Self {
        match domain {
            "huggingface.co" | "hf.co" => Host::HuggingFace,
            "github.com" => Host::GitHub,
            "gitlab.com" => Host::GitLab,
            "bitbucket.org" => Host::Bitbucket,
            other => Host::Other(other.to_string()),
        }
    }

    /// Hosts a repository can be cloned from for static analysis.
    pub fn is_code_host(&self) -> bool {
        matches!(self, Host::GitHub | Host::GitLab | Host::Bitbucket)
    }

    /// Hosts that expose merged review requests.
    pub fn is_review_host(&self) -> bool {
        matches!(self, Host::GitHub)
    }

    pub fn domain(&self) -> &str {
        match self {
            Host::HuggingFace => "huggingface.co",
            Host::GitHub => "github.com",
            Host::GitLab => "gitlab.com",
            Host::Bitbucket => "bitbucket.org",
            Host::Other(domain) => domain,
        }
    }
}

/// A resolved reference to a model, dataset or code repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Canonical URL.
    pub url: String,
    pub host: Host,
    /// Owning organisation or user, absent for single-segment hub repos.
    pub namespace: Option<String>,
    pub name: String,
    pub kind: ArtifactKind,
}

impl ArtifactRef {
    /// Parse a URL (or `hf://` / bare `namespace/name` shorthand) and infer its kind.
    ///
    /// Hub URLs under `/datasets/` are datasets, repositories on a code host
    /// are code, every other hub URL is a model.
    pub fn parse(reference: &str) -> Result<Self> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(TrustScoreError::invalid_reference(reference, "empty artifact reference"));
        }

        let normalized = normalize_scheme(trimmed);
        let url = url::Url::parse(&normalized)
            .map_err(|e| TrustScoreError::invalid_reference(reference, e.to_string()))?;

        let domain = url
            .host_str()
            .map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
            .ok_or_else(|| TrustScoreError::invalid_reference(reference, "URL has no host"))?;
        let host = Host::from_domain(&domain);

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let (namespace, name, kind, canonical_path) = match &host {
            Host::HuggingFace => {
                let (kind, rest) = match segments.first() {
                    Some(&"datasets") => (ArtifactKind::Dataset, &segments[1..]),
                    _ => (ArtifactKind::Model, &segments[..]),
                };
                let (namespace, name) = match rest {
                    [] => {
                        return Err(TrustScoreError::invalid_reference(
                            reference,
                            "hub URL names no repository",
                        ))
                    }
                    [name] => (None, name.to_string()),
                    [namespace, name, ..] => (Some(namespace.to_string()), name.to_string()),
                };
                let prefix = if kind == ArtifactKind::Dataset { "datasets/" } else { "" };
                let path = match &namespace {
                    Some(ns) => format!("{}{}/{}", prefix, ns, name),
                    None => format!("{}{}", prefix, name),
                };
                (namespace, name, kind, path)
            }
            _ => match segments.as_slice() {
                [namespace, name, ..] => {
                    let name = name.trim_end_matches(".git").to_string();
                    let path = format!("{}/{}", namespace, name);
                    (Some(namespace.to_string()), name, ArtifactKind::Code, path)
                }
                _ => {
                    return Err(TrustScoreError::invalid_reference(
                        reference,
                        "repository URL needs an owner and a name",
                    ))
                }
            },
        };

        if name.is_empty() {
            return Err(TrustScoreError::invalid_reference(reference, "empty repository name"));
        }

        Ok(Self {
            url: format!("https://{}/{}", host.domain(), canonical_path),
            host,
            namespace,
            name,
            kind,
        })
    }

    /// Hub-style repository id: `namespace/name`, or just `name`.
    pub fn repo_id(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}/{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

fn normalize_scheme(reference: &str) -> String {
    if let Some(rest) = reference.strip_prefix("hf://") {
        return format!("https://huggingface.co/{}", rest);
    }
    if reference.contains("://") {
        return reference.to_string();
    }
    let first = reference.split('/').next().unwrap_or_default();
    if first.contains('.') {
        // Host without a scheme, e.g. `github.com/org/repo`.
        format!("https://{}", reference)
    } else {
        format!("https://huggingface.co/{}", reference)
    }
}

/// The model being rated together with its linked dataset and code repository.
///
/// The dataset and code links are owned by this target alone; their presence
/// drives the availability half of `dataset_and_code_score`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTarget {
    pub model: ArtifactRef,
    pub dataset: Option<ArtifactRef>,
    pub code: Option<ArtifactRef>,
}

impl ModelTarget {
    /// A target with no linked dataset or code.
    pub fn new(model: ArtifactRef) -> Self {
        Self {
            model,
            dataset: None,
            code: None,
        }
    }

    /// Parse a model URL plus optional dataset and code URLs.
    ///
    /// An empty or malformed model reference, or one that points at a code
    /// host, is an input error. Malformed dataset or code links are logged
    /// and treated as absent.
    pub fn parse(model: &str, dataset: Option<&str>, code: Option<&str>) -> Result<Self> {
        let model_ref = ArtifactRef::parse(model)?;
        if model_ref.kind != ArtifactKind::Model {
            return Err(TrustScoreError::invalid_reference(
                model,
                format!("expected a model, found a {} reference", model_ref.kind),
            ));
        }

        Ok(Self {
            model: model_ref,
            dataset: parse_link(dataset, ArtifactKind::Dataset),
            code: parse_link(code, ArtifactKind::Code),
        })
    }

    pub fn with_dataset(mut self, dataset: ArtifactRef) -> Self {
        self.dataset = Some(dataset);
        self
    }

    pub fn with_code(mut self, code: ArtifactRef) -> Self {
        self.code = Some(code);
        self
    }

    /// 1.0 when a dataset is linked, else 0.0.
    pub fn dataset_availability(&self) -> f64 {
        if self.dataset.is_some() { 1.0 } else { 0.0 }
    }

    /// 1.0 when a code repository is linked, else 0.0.
    pub fn code_availability(&self) -> f64 {
        if self.code.is_some() { 1.0 } else { 0.0 }
    }
}

fn parse_link(link: Option<&str>, kind: ArtifactKind) -> Option<ArtifactRef> {
    let link = link.map(str::trim).filter(|l| !l.is_empty())?;
    match ArtifactRef::parse(link) {
        Ok(mut reference) => {
            // A dataset linked by a plain hub URL is still a dataset.
            if kind == ArtifactKind::Dataset && reference.host == Host::HuggingFace {
                reference.kind = ArtifactKind::Dataset;
            }
            Some(reference)
        }
        Err(e) => {
            warn!("Ignoring malformed {} link {:?}: {}", kind, link, e);
            None
        }
    }
}

/// An entry of the artifact registry consulted during lineage resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownArtifact {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub kind: ArtifactKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl KnownArtifact {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: None,
            kind,
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Resolve the registry URL into a reference, if it has a usable one.
    pub fn reference(&self) -> Option<ArtifactRef> {
        self.url.as_deref().and_then(|url| ArtifactRef::parse(url).ok())
    }
}
