//! TrustScore Core - concurrent trustworthiness scoring for ML model artifacts.
//!
//! Given a model reference (plus optional dataset and code links), the
//! [`ScoringEngine`] runs every judgment function concurrently against a set
//! of [`Collaborators`] and folds the results into a [`ScoreRecord`]: a
//! weighted composite score with per-metric values and latencies.
//!
//! Collaborators are traits, so the engine runs equally against the live
//! hub, GitHub and completion APIs or against in-memory test doubles.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trustscore_core::{Collaborators, Credentials, ModelTarget, ScoringEngine, StaticCatalog};
//!
//! #[tokio::main]
//! async fn main() -> trustscore_core::Result<()> {
//!     let collaborators = Collaborators::live(Arc::new(StaticCatalog::empty()))?;
//!     let engine = ScoringEngine::builder(collaborators).build()?;
//!
//!     let target = ModelTarget::parse(
//!         "https://huggingface.co/google-bert/bert-base-uncased",
//!         Some("https://huggingface.co/datasets/bookcorpus/bookcorpus"),
//!         Some("https://github.com/google-research/bert"),
//!     )?;
//!     let record = engine.evaluate(&target, &Credentials::from_env()).await?;
//!     println!("{}", serde_json::to_string(&record)?);
//!
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod card;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod lineage;
pub mod metrics;
pub mod network;
pub mod record;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use artifact::{ArtifactKind, ArtifactRef, Host, KnownArtifact, ModelTarget};
pub use collaborators::{
    ArtifactCatalog, ArtifactHost, CodeAnalysis, CodeAnalyzer, Collaborators, CommitRecord,
    CompletionClient, Credentials, ExecutionOutcome, RegistryFileCatalog, RepoFile, RepoManifest,
    ReviewHost, ReviewRequest, Sandbox, StaticCatalog,
};
pub use config::{ScoringConfig, WeightTable};
pub use engine::{LineageScope, ParentScorer, ScoringEngine, ScoringEngineBuilder};
pub use error::{Result, TrustScoreError};
pub use lineage::{LineageGraph, LineageResolver};
pub use metrics::{Metric, MetricContext, MetricKind, MetricValue};
pub use record::{MetricResult, ScoreRecord};
