//! Heuristic lineage resolution.
//!
//! Parents of a model are found two ways: hub repository ids declared in
//! well-known manifest fields, and registry artifacts whose name or id
//! appears among the manifest's string values. The graph is expanded
//! breadth-first over ancestors, each node at most once. A full lineage
//! query then adds known models whose manifests name the root or one of its
//! descendants.

use crate::artifact::{ArtifactKind, ArtifactRef, KnownArtifact};
use crate::collaborators::ArtifactHost;
use crate::config::LineagePolicy;
use crate::error::{Result, TrustScoreError};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

/// Single-valued manifest fields that name a parent repository.
const PARENT_FIELDS: &[&str] = &[
    "base_model_name_or_path",
    "base_model",
    "init_model_name_or_path",
    "peft_base_model_id",
    "merge_base_model",
    "source_model",
    "teacher_model_name_or_path",
    "vision_model_name_or_path",
    "text_model_name_or_path",
    "llm_model_name_or_path",
    "model_id",
    "adapter_model_name_or_path",
    "tokenizer_name_or_path",
];

/// List-valued manifest fields that name parent repositories.
const PARENT_LIST_FIELDS: &[&str] = &[
    "merge_base_models",
    "parent_models",
    "source_models",
    "model_fusion_sources",
    "models_to_merge",
];

/// Fields of a nested adapter (`peft_config` / `peft`) section.
const ADAPTER_FIELDS: &[&str] = &["base_model_name_or_path", "target_model", "model_id"];

/// How a node entered the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineageSource {
    RegistryMatch,
    ConfigField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    BaseModel,
    FineTuningDataset,
}

/// Confidence of a parent match, strongest last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchPriority {
    /// Only the registry id appeared in the manifest.
    IdOnly,
    /// The registry name appeared in the manifest.
    Name,
    /// The registry name appeared in the manifest and is part of the child's own name.
    NameInCurrent,
    /// Declared in a well-known parent field.
    ConfigField,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineageNode {
    pub artifact_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub source: LineageSource,
    #[serde(rename = "repository_url", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip)]
    pub kind: ArtifactKind,
}

impl LineageNode {
    fn from_known(artifact: &KnownArtifact, source: LineageSource) -> Self {
        Self {
            artifact_id: artifact.id.clone(),
            name: artifact.name.clone(),
            version: artifact.version.clone(),
            source,
            url: artifact.url.clone(),
            kind: artifact.kind,
        }
    }

    /// A hub model known only by its repository id.
    fn from_repo_id(repo_id: &str) -> Self {
        Self {
            artifact_id: repo_id.to_string(),
            name: repo_id.to_string(),
            version: None,
            source: LineageSource::ConfigField,
            url: Some(hub_url(repo_id)),
            kind: ArtifactKind::Model,
        }
    }

    pub fn reference(&self) -> Option<ArtifactRef> {
        self.url.as_deref().and_then(|url| ArtifactRef::parse(url).ok())
    }
}

/// Directed `parent -> child` edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineageEdge {
    #[serde(rename = "from_node_artifact_id")]
    pub from: String,
    #[serde(rename = "to_node_artifact_id")]
    pub to: String,
    pub relationship: Relationship,
    #[serde(skip)]
    pub priority: MatchPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineageGraph {
    #[serde(skip)]
    pub root: String,
    pub nodes: Vec<LineageNode>,
    pub edges: Vec<LineageEdge>,
}

impl LineageGraph {
    fn new(root: LineageNode) -> Self {
        Self {
            root: root.artifact_id.clone(),
            nodes: vec![root],
            edges: Vec::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&LineageNode> {
        self.nodes.iter().find(|n| n.artifact_id == id)
    }

    /// Edges into `id`, strongest match first.
    pub fn parents(&self, id: &str) -> Vec<&LineageEdge> {
        let mut parents: Vec<&LineageEdge> = self.edges.iter().filter(|e| e.to == id).collect();
        parents.sort_by(|a, b| b.priority.cmp(&a.priority));
        parents
    }

    fn add_node(&mut self, node: LineageNode) {
        if self.node(&node.artifact_id).is_none() {
            self.nodes.push(node);
        }
    }

    /// Insert an edge, keeping the strongest priority for a repeated pair.
    fn add_edge(&mut self, edge: LineageEdge) {
        if edge.from == edge.to {
            return;
        }
        match self.edges.iter_mut().find(|e| e.from == edge.from && e.to == edge.to) {
            Some(existing) => existing.priority = existing.priority.max(edge.priority),
            None => self.edges.push(edge),
        }
    }
}

/// A parent found in one manifest.
struct ParentMatch {
    node: LineageNode,
    relationship: Relationship,
    priority: MatchPriority,
}

pub struct LineageResolver {
    host: Arc<dyn ArtifactHost>,
    policy: LineagePolicy,
}

impl LineageResolver {
    pub fn new(host: Arc<dyn ArtifactHost>, policy: LineagePolicy) -> Self {
        Self { host, policy }
    }

    /// Build the lineage component of `root`: its ancestors, plus known
    /// models descending from the root within `max_depth` hops.
    ///
    /// Fails only when the root's own manifest cannot be fetched or parsed.
    pub async fn build_lineage(
        &self,
        root: &KnownArtifact,
        known: &[KnownArtifact],
    ) -> Result<LineageGraph> {
        let mut graph = self.build_ancestry(root, known).await?;
        self.add_descendants(&mut graph, known).await;
        debug!(
            "Lineage of {}: {} nodes, {} edges",
            graph.root,
            graph.nodes.len(),
            graph.edges.len()
        );
        Ok(graph)
    }

    /// Build the ancestor graph of `root`.
    ///
    /// Fails only when the root's own manifest cannot be fetched or parsed;
    /// unreachable ancestors are logged and left unexpanded.
    pub async fn build_ancestry(
        &self,
        root: &KnownArtifact,
        known: &[KnownArtifact],
    ) -> Result<LineageGraph> {
        let root_node = LineageNode::from_known(root, LineageSource::RegistryMatch);
        let root_ref = root_node.reference().ok_or_else(|| TrustScoreError::Lineage {
            message: format!("artifact {} has no resolvable URL", root.id),
        })?;

        let mut graph = LineageGraph::new(root_node.clone());
        let mut enqueued: HashSet<String> = HashSet::from([root_node.artifact_id.clone()]);
        let mut queue = VecDeque::from([(root_node, root_ref, 0usize)]);

        while let Some((node, reference, depth)) = queue.pop_front() {
            let manifest = match self.fetch_manifest(&reference).await {
                Ok(manifest) => manifest,
                Err(e) if depth == 0 => return Err(e),
                Err(e) => {
                    warn!("Skipping lineage of {}: {}", node.artifact_id, e);
                    continue;
                }
            };

            for parent in self.find_parents(&node, &manifest, known) {
                let parent_id = parent.node.artifact_id.clone();
                graph.add_edge(LineageEdge {
                    from: parent_id.clone(),
                    to: node.artifact_id.clone(),
                    relationship: parent.relationship,
                    priority: parent.priority,
                });

                let expandable = parent.relationship == Relationship::BaseModel
                    && depth + 1 < self.policy.max_depth;
                let reference = parent.node.reference();
                graph.add_node(parent.node.clone());

                if !enqueued.insert(parent_id.clone()) || !expandable {
                    continue;
                }
                match reference {
                    Some(reference) => queue.push_back((parent.node, reference, depth + 1)),
                    None => debug!("Not expanding {}: no URL", parent_id),
                }
            }
        }

        Ok(graph)
    }

    /// Breadth-first search downwards: a known model whose manifest names a
    /// node as its base model becomes that node's child. Nodes already in
    /// the graph are never added twice, so ancestors cannot reappear below.
    async fn add_descendants(&self, graph: &mut LineageGraph, known: &[KnownArtifact]) {
        let Some(root) = graph.node(&graph.root).cloned() else {
            return;
        };
        let mut manifests: HashMap<String, Option<Value>> = HashMap::new();
        let mut enqueued: HashSet<String> = graph.nodes.iter().map(|n| n.artifact_id.clone()).collect();
        let mut queue = VecDeque::from([(root, 0usize)]);

        while let Some((node, depth)) = queue.pop_front() {
            for candidate in known {
                if candidate.kind != ArtifactKind::Model || enqueued.contains(&candidate.id) {
                    continue;
                }
                let Some(reference) = candidate.reference() else {
                    continue;
                };
                if !manifests.contains_key(&candidate.id) {
                    let fetched = match self.fetch_manifest(&reference).await {
                        Ok(manifest) => Some(manifest),
                        Err(e) => {
                            debug!("No descendant check for {}: {}", candidate.id, e);
                            None
                        }
                    };
                    manifests.insert(candidate.id.clone(), fetched);
                }
                let Some(Some(manifest)) = manifests.get(&candidate.id) else {
                    continue;
                };

                let child = LineageNode::from_known(candidate, LineageSource::RegistryMatch);
                let Some(link) = self
                    .find_parents(&child, manifest, known)
                    .into_iter()
                    .find(|p| p.relationship == Relationship::BaseModel && p.node.artifact_id == node.artifact_id)
                else {
                    continue;
                };

                graph.add_edge(LineageEdge {
                    from: node.artifact_id.clone(),
                    to: child.artifact_id.clone(),
                    relationship: link.relationship,
                    priority: link.priority,
                });
                graph.add_node(child.clone());
                enqueued.insert(child.artifact_id.clone());
                if depth + 1 < self.policy.max_depth {
                    queue.push_back((child, depth + 1));
                }
            }
        }
    }

    async fn fetch_manifest(&self, reference: &ArtifactRef) -> Result<Value> {
        let text = self
            .host
            .fetch_text_file(reference, &self.policy.manifest_filename)
            .await
            .map_err(|e| TrustScoreError::Lineage {
                message: format!("could not fetch {} of {}: {}", self.policy.manifest_filename, reference, e),
            })?;
        let value: Value = serde_json::from_str(&text).map_err(|e| TrustScoreError::Lineage {
            message: format!("malformed {} of {}: {}", self.policy.manifest_filename, reference, e),
        })?;
        if !value.is_object() {
            return Err(TrustScoreError::Lineage {
                message: format!("{} of {} is not a JSON object", self.policy.manifest_filename, reference),
            });
        }
        Ok(value)
    }

    fn find_parents(&self, child: &LineageNode, manifest: &Value, known: &[KnownArtifact]) -> Vec<ParentMatch> {
        let child_repo = child.reference().map(|r| r.repo_id().to_lowercase());
        let mut parents = Vec::new();

        for repo_id in declared_parents(manifest) {
            if child_repo.as_deref() == Some(repo_id.to_lowercase().as_str()) {
                continue;
            }
            let node = match find_known_by_repo_id(known, &repo_id) {
                Some(artifact) => LineageNode::from_known(artifact, LineageSource::ConfigField),
                None => LineageNode::from_repo_id(&repo_id),
            };
            if node.artifact_id == child.artifact_id {
                continue;
            }
            parents.push(ParentMatch {
                node,
                relationship: Relationship::BaseModel,
                priority: MatchPriority::ConfigField,
            });
        }

        let tokens = collect_strings(manifest);
        let child_name = child.name.trim().to_lowercase();
        for candidate in known.iter().filter(|k| k.id != child.artifact_id) {
            let Some(priority) = self.match_candidate(candidate, &tokens, &child_name) else {
                continue;
            };
            let relationship = match candidate.kind {
                ArtifactKind::Dataset => Relationship::FineTuningDataset,
                _ => Relationship::BaseModel,
            };
            parents.push(ParentMatch {
                node: LineageNode::from_known(candidate, LineageSource::RegistryMatch),
                relationship,
                priority,
            });
        }

        parents
    }

    fn match_candidate(
        &self,
        candidate: &KnownArtifact,
        tokens: &BTreeSet<String>,
        child_name: &str,
    ) -> Option<MatchPriority> {
        let min = self.policy.min_token_len;
        let name = candidate.name.trim().to_lowercase();
        if name.chars().count() >= min && name != child_name && tokens_mention(tokens, &name, min) {
            return Some(if child_name.contains(&name) {
                MatchPriority::NameInCurrent
            } else {
                MatchPriority::Name
            });
        }

        let id = candidate.id.trim().to_lowercase();
        (id.chars().count() >= min && tokens_mention(tokens, &id, min)).then_some(MatchPriority::IdOnly)
    }
}

/// Whether `needle` is a substring of a manifest token, or a long-enough
/// token is a substring of `needle`.
fn tokens_mention(tokens: &BTreeSet<String>, needle: &str, min_len: usize) -> bool {
    tokens
        .iter()
        .any(|t| t.contains(needle) || (t.chars().count() >= min_len && needle.contains(t.as_str())))
}

/// Every string key and value in `value`, trimmed and lowercased.
pub fn collect_strings(value: &Value) -> BTreeSet<String> {
    fn walk(value: &Value, found: &mut BTreeSet<String>) {
        match value {
            Value::String(s) => insert_token(s, found),
            Value::Array(items) => items.iter().for_each(|item| walk(item, found)),
            Value::Object(map) => {
                for (key, item) in map {
                    insert_token(key, found);
                    walk(item, found);
                }
            }
            _ => {}
        }
    }

    fn insert_token(raw: &str, found: &mut BTreeSet<String>) {
        let token = raw.trim().to_lowercase();
        if !token.is_empty() {
            found.insert(token);
        }
    }

    let mut found = BTreeSet::new();
    walk(value, &mut found);
    found
}

/// Hub repository ids declared in well-known parent fields, deduplicated in
/// declaration order.
pub fn declared_parents(manifest: &Value) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut push = |candidate: &Value| {
        if let Some(s) = candidate.as_str().map(str::trim) {
            if looks_like_hub_repo(s) && !found.iter().any(|f| f == s) {
                found.push(s.to_string());
            }
        }
    };

    for field in PARENT_FIELDS {
        if let Some(v) = manifest.get(field) {
            push(v);
        }
    }
    for field in PARENT_LIST_FIELDS {
        if let Some(items) = manifest.get(field).and_then(Value::as_array) {
            items.iter().for_each(&mut push);
        }
    }
    let adapter = manifest
        .get("peft_config")
        .filter(|v| v.is_object())
        .or_else(|| manifest.get("peft"))
        .and_then(Value::as_object);
    if let Some(adapter) = adapter {
        for field in ADAPTER_FIELDS {
            if let Some(v) = adapter.get(*field) {
                push(v);
            }
        }
    }

    found
}

/// `namespace/name`, or a dashed single-segment id; never a filesystem path.
pub fn looks_like_hub_repo(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() {
        return false;
    }
    match s.split_once('/') {
        Some((left, right)) => {
            !left.is_empty() && !right.is_empty() && !right.contains(['\\', ' ', '\t'])
        }
        None => s.contains('-') && !s.contains([' ', '\\']),
    }
}

fn hub_url(repo_id: &str) -> String {
    format!("{}/{}", crate::config::HubConfig::HUB_BASE, repo_id.trim())
}

fn find_known_by_repo_id<'a>(known: &'a [KnownArtifact], repo_id: &str) -> Option<&'a KnownArtifact> {
    known.iter().find(|k| {
        k.kind == ArtifactKind::Model
            && (k.name.eq_ignore_ascii_case(repo_id)
                || k.reference().is_some_and(|r| r.repo_id().eq_ignore_ascii_case(repo_id)))
    })
}

/// The registry entry for `reference`, or a synthetic one keyed by its repository id.
pub fn known_or_synthetic(reference: &ArtifactRef, known: &[KnownArtifact]) -> KnownArtifact {
    let repo_id = reference.repo_id();
    known
        .iter()
        .find(|k| k.reference().is_some_and(|r| r.url == reference.url))
        .cloned()
        .unwrap_or_else(|| {
            KnownArtifact::new(repo_id.clone(), reference.name.clone(), reference.kind)
                .with_url(reference.url.clone())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockHost;
    use serde_json::json;

    fn model(id: &str, name: &str, repo: &str) -> KnownArtifact {
        KnownArtifact::new(id, name, ArtifactKind::Model).with_url(hub_url(repo))
    }

    fn resolver(host: MockHost) -> LineageResolver {
        LineageResolver::new(Arc::new(host), LineagePolicy::default())
    }

    #[test]
    fn test_looks_like_hub_repo() {
        assert!(looks_like_hub_repo("meta-llama/Llama-2-7b"));
        assert!(looks_like_hub_repo("gpt2-medium"));
        assert!(!looks_like_hub_repo("gpt2"));
        assert!(!looks_like_hub_repo("/local/path with space"));
        assert!(!looks_like_hub_repo("org/some model"));
        assert!(!looks_like_hub_repo(""));
    }

    #[test]
    fn test_declared_parents() {
        let manifest = json!({
            "base_model_name_or_path": "meta-llama/Llama-2-7b",
            "merge_base_models": ["org/a-model", "not a repo", "org/a-model"],
            "peft_config": {"target_model": "org/target"},
            "model_type": "llama",
        });
        assert_eq!(
            declared_parents(&manifest),
            vec!["meta-llama/Llama-2-7b", "org/a-model", "org/target"]
        );
    }

    #[test]
    fn test_collect_strings_walks_keys_and_values() {
        let tokens = collect_strings(&json!({"A": [" Artifact-B ", {"nested": "X"}], "n": 3}));
        assert!(tokens.contains("artifact-b"));
        assert!(tokens.contains("nested"));
        assert!(tokens.contains("a"));
        assert!(!tokens.contains("3"));
    }

    #[tokio::test]
    async fn test_registry_name_match_yields_single_edge() {
        let host = MockHost::new().with_file("org/model-a", "config.json", r#"{"notes": "built on artifact-B"}"#);
        let a = model("1", "model-a", "org/model-a");
        let b = model("2", "artifact-B", "org/artifact-b");
        let graph = resolver(host).build_lineage(&a, &[a.clone(), b]).await.unwrap();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        let edge = &graph.edges[0];
        assert_eq!((edge.from.as_str(), edge.to.as_str()), ("2", "1"));
        assert_eq!(edge.relationship, Relationship::BaseModel);
    }

    #[tokio::test]
    async fn test_no_match_yields_single_node() {
        let host = MockHost::new().with_file("org/model-a", "config.json", r#"{"model_type": "bert"}"#);
        let a = model("1", "model-a", "org/model-a");
        let other = model("2", "unrelated-thing", "org/unrelated-thing");
        let graph = resolver(host).build_lineage(&a, &[a.clone(), other]).await.unwrap();

        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[tokio::test]
    async fn test_self_and_cyclic_references_terminate() {
        let host = MockHost::new()
            .with_file("org/model-a", "config.json", r#"{"base_model": "org/model-a", "x": "model-b"}"#)
            .with_file("org/model-b", "config.json", r#"{"base_model": "org/model-a"}"#);
        let a = model("1", "model-a", "org/model-a");
        let b = model("2", "model-b", "org/model-b");
        let graph = resolver(host).build_lineage(&a, &[a.clone(), b]).await.unwrap();

        assert!(graph.edges.iter().all(|e| e.from != e.to));
        assert_eq!(graph.parents("1").len(), 1);
        assert_eq!(graph.nodes.len(), 2);
    }

    #[tokio::test]
    async fn test_config_field_parent_outranks_name_match() {
        let host = MockHost::new().with_file(
            "org/child",
            "config.json",
            r#"{"base_model": "org/parent-model", "_name_or_path": "tiny-helper"}"#,
        );
        let child = model("1", "child", "org/child");
        let helper = model("3", "tiny-helper", "org/tiny-helper");
        let graph = resolver(host).build_lineage(&child, &[child.clone(), helper]).await.unwrap();

        let parents = graph.parents("1");
        assert_eq!(parents.len(), 2);
        assert_eq!(parents[0].from, "org/parent-model");
        assert_eq!(parents[0].priority, MatchPriority::ConfigField);
        assert_eq!(graph.node("org/parent-model").unwrap().source, LineageSource::ConfigField);
    }

    #[tokio::test]
    async fn test_dataset_match_is_fine_tuning_dataset() {
        let host = MockHost::new().with_file("org/child", "config.json", r#"{"dataset": "squad-v2"}"#);
        let child = model("1", "child", "org/child");
        let squad = KnownArtifact::new("7", "squad-v2", ArtifactKind::Dataset);
        let graph = resolver(host).build_lineage(&child, &[squad]).await.unwrap();

        assert_eq!(graph.edges[0].relationship, Relationship::FineTuningDataset);
    }

    #[tokio::test]
    async fn test_descendants_join_the_component() {
        let host = MockHost::new()
            .with_file("org/base", "config.json", r#"{"model_type": "bert"}"#)
            .with_file("org/tuned", "config.json", r#"{"base_model": "org/base"}"#)
            .with_file("org/distilled", "config.json", r#"{"_name_or_path": "tuned-model"}"#)
            .with_file("org/other", "config.json", r#"{"model_type": "vit"}"#);
        let base = model("1", "base-model", "org/base");
        let tuned = model("2", "tuned-model", "org/tuned");
        let distilled = model("3", "distilled-model", "org/distilled");
        let other = model("4", "other-model", "org/other");
        let known = [base.clone(), tuned, distilled, other];

        let resolver = resolver(host);
        let graph = resolver.build_lineage(&base, &known).await.unwrap();
        assert_eq!(graph.nodes.len(), 3);
        assert!(graph.node("4").is_none());
        assert!(graph.edges.iter().any(|e| e.from == "1" && e.to == "2"));
        assert!(graph.edges.iter().any(|e| e.from == "2" && e.to == "3"));
        assert!(graph.parents("1").is_empty());

        let ancestry = resolver.build_ancestry(&base, &known).await.unwrap();
        assert_eq!(ancestry.nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_siblings_are_not_descendants() {
        let host = MockHost::new()
            .with_file("org/child", "config.json", r#"{"base_model": "org/parent"}"#)
            .with_file("org/parent", "config.json", r#"{"model_type": "gpt2"}"#)
            .with_file("org/sibling", "config.json", r#"{"base_model": "org/parent"}"#);
        let child = model("1", "child-model", "org/child");
        let parent = model("2", "parent-model", "org/parent");
        let sibling = model("3", "sibling-model", "org/sibling");
        let graph = resolver(host)
            .build_lineage(&child, &[child.clone(), parent, sibling])
            .await
            .unwrap();

        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.node("3").is_none());
        assert_eq!(graph.parents("1").len(), 1);
    }

    #[tokio::test]
    async fn test_root_manifest_failure_is_an_error() {
        let a = model("1", "model-a", "org/model-a");
        let err = resolver(MockHost::new()).build_lineage(&a, &[]).await.unwrap_err();
        assert!(matches!(err, TrustScoreError::Lineage { .. }));
    }

    #[test]
    fn test_graph_serializes_edges_by_artifact_id() {
        let mut graph = LineageGraph::new(LineageNode::from_repo_id("org/child"));
        graph.add_node(LineageNode::from_repo_id("org/base"));
        graph.add_edge(LineageEdge {
            from: "org/base".into(),
            to: "org/child".into(),
            relationship: Relationship::BaseModel,
            priority: MatchPriority::ConfigField,
        });
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(
            json["edges"][0],
            json!({
                "from_node_artifact_id": "org/base",
                "to_node_artifact_id": "org/child",
                "relationship": "base_model",
            })
        );
        assert_eq!(json["nodes"][1]["source"], "config_field");
    }
}
