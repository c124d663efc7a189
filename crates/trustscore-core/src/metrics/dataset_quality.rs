//! Dataset quality: dataset popularity and a judgment of the card's training-data section.

use super::{clamp_unit, popularity_score, Metric, MetricContext, MetricKind, MetricValue};
use crate::artifact::Host;
use crate::card::{training_data_excerpt, truncate_chars};
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

pub struct DatasetQualityMetric;

fn dataset_prompt(excerpt: &str) -> String {
    format!(
        "Assess the quality of the dataset used to train this model. \
         Provide a score between 0 (very low quality) and 1 (very high quality). \
         Dataset quality refers to variety and coverage of the data, size and scale, \
         and clarity of documentation. \
         Provide only the numeric score as output, without any additional text or explanation.\
         \n\nTraining-data excerpt from the model README:\n```\n{excerpt}\n```"
    )
}

/// Blend whichever signals exist; nothing at all scores zero.
pub(crate) fn combine(llm: Option<f64>, popularity: Option<f64>, llm_share: f64) -> f64 {
    let combined = match (llm, popularity) {
        (Some(l), Some(p)) => llm_share * l + (1.0 - llm_share) * p,
        (Some(l), None) => l,
        (None, Some(p)) => p,
        (None, None) => 0.0,
    };
    clamp_unit(combined)
}

impl DatasetQualityMetric {
    async fn popularity(&self, ctx: &MetricContext) -> Option<f64> {
        let dataset = ctx.target.dataset.as_ref().filter(|d| d.host == Host::HuggingFace)?;
        match ctx.collaborators.host.fetch_manifest(dataset).await {
            Ok(manifest) => Some(popularity_score(
                manifest.downloads,
                manifest.likes,
                &ctx.config.dataset_popularity,
            )),
            Err(e) => {
                debug!("Dataset popularity unavailable for {}: {}", dataset.repo_id(), e);
                None
            }
        }
    }

    async fn judgment(&self, ctx: &MetricContext) -> Option<f64> {
        let card = ctx.model_card().await.ok()?;
        let excerpt = training_data_excerpt(&card)?;
        let prompt = dataset_prompt(truncate_chars(excerpt, ctx.config.max_prompt_chars));
        match ctx.ask_for_score(&prompt).await {
            Ok(score) => Some(score),
            Err(e) => {
                debug!("Dataset judgment failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Metric for DatasetQualityMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::DatasetQuality
    }

    async fn evaluate(&self, ctx: &MetricContext) -> Result<MetricValue> {
        let (popularity, llm) = futures::join!(self.popularity(ctx), self.judgment(ctx));
        Ok(MetricValue::Score(combine(llm, popularity, ctx.config.dataset_llm_share)))
    }
}
