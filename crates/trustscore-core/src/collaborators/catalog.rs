//! Artifact registries consulted during lineage resolution.

use super::ArtifactCatalog;
use crate::artifact::{ArtifactKind, KnownArtifact};
use crate::error::{Result, TrustScoreError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A fixed, in-memory list of known artifacts.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    artifacts: Vec<KnownArtifact>,
}

impl StaticCatalog {
    pub fn new(artifacts: Vec<KnownArtifact>) -> Self {
        Self { artifacts }
    }

    /// A catalog with no entries; lineage then relies on manifest fields alone.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactCatalog for StaticCatalog {
    async fn known_artifacts(&self) -> Result<Vec<KnownArtifact>> {
        Ok(self.artifacts.clone())
    }
}

/// A registry stored as a JSON file.
///
/// Two layouts are accepted: an object keyed by artifact id, or a list of
/// entries carrying their id in `metadata.id`. Each entry looks like
/// `{"metadata": {"name", "version", "type"}, "data": {"url"}}`.
#[derive(Debug, Clone)]
pub struct RegistryFileCatalog {
    path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct RegistryEntry {
    #[serde(default)]
    metadata: RegistryMetadata,
    #[serde(default)]
    data: RegistryData,
}

#[derive(Debug, Default, Deserialize)]
struct RegistryMetadata {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RegistryData {
    #[serde(default)]
    url: Option<String>,
}

impl RegistryFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Render a JSON id or version (string or number) as text.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn to_known(fallback_id: Option<String>, entry: RegistryEntry) -> Option<KnownArtifact> {
    let id = entry.metadata.id.as_ref().and_then(value_text).or(fallback_id)?;
    let name = entry.metadata.name.filter(|n| !n.trim().is_empty())?;
    let kind = entry
        .metadata
        .kind
        .as_deref()
        .and_then(ArtifactKind::from_label)
        .unwrap_or(ArtifactKind::Model);

    Some(KnownArtifact {
        id,
        name: name.trim().to_string(),
        version: entry.metadata.version.as_ref().and_then(value_text),
        kind,
        url: entry.data.url.filter(|u| !u.trim().is_empty()),
    })
}

/// Parse registry JSON in either supported layout.
pub(crate) fn parse_registry(json: &str) -> Result<Vec<KnownArtifact>> {
    let root: Value = serde_json::from_str(json)?;
    let entries: Vec<(Option<String>, Value)> = match root {
        Value::Object(map) => map.into_iter().map(|(id, v)| (Some(id), v)).collect(),
        Value::Array(items) => items.into_iter().map(|v| (None, v)).collect(),
        _ => {
            return Err(TrustScoreError::Validation {
                field: "registry".to_string(),
                message: "registry must be a JSON object or array".to_string(),
            })
        }
    };

    let mut known = Vec::with_capacity(entries.len());
    for (id, value) in entries {
        match serde_json::from_value::<RegistryEntry>(value) {
            Ok(entry) => match to_known(id, entry) {
                Some(artifact) => known.push(artifact),
                None => debug!("Skipping registry entry without id or name"),
            },
            Err(e) => warn!("Skipping malformed registry entry: {}", e),
        }
    }
    Ok(known)
}

#[async_trait]
impl ArtifactCatalog for RegistryFileCatalog {
    async fn known_artifacts(&self) -> Result<Vec<KnownArtifact>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| TrustScoreError::io_with_path(e, &self.path))?;
        let known = parse_registry(&contents)?;
        debug!("Loaded {} artifacts from {}", known.len(), self.path.display());
        Ok(known)
    }
}
