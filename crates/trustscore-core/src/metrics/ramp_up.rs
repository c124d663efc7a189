//! Ramp-up time: popularity blended with a documentation-quality judgment.

use super::{popularity_score, Metric, MetricContext, MetricKind, MetricValue};
use crate::card::truncate_chars;
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

pub struct RampUpMetric;

fn ramp_up_prompt(url: &str, card: Option<&str>) -> String {
    let mut prompt = format!(
        "Assess the ramp-up time for using the model located at \"{url}\". \
         Provide a score between 0 (very difficult) and 1 (very easy). \
         Ramp-up time is the time a new user needs to become productive with the model, \
         judged from documentation quality and clarity, community support and model complexity. \
         If the README contains only headers without meaningful text, return a low score. \
         Provide only the numeric score as output, without any additional text or explanation."
    );
    if let Some(card) = card {
        prompt.push_str("\n\nModel README:\n```\n");
        prompt.push_str(card);
        prompt.push_str("\n```");
    }
    prompt
}

/// `share * popularity + (1 - share) * llm`, or the judgment alone when
/// popularity is unknown.
pub(crate) fn blend(popularity: Option<f64>, llm: f64, popularity_share: f64) -> f64 {
    match popularity {
        Some(p) => popularity_share * p + (1.0 - popularity_share) * llm,
        None => llm,
    }
}

#[async_trait]
impl Metric for RampUpMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::RampUpTime
    }

    async fn evaluate(&self, ctx: &MetricContext) -> Result<MetricValue> {
        let model = &ctx.target.model;
        let popularity = match ctx.collaborators.host.fetch_manifest(model).await {
            Ok(manifest) => Some(popularity_score(
                manifest.downloads,
                manifest.likes,
                &ctx.config.ramp_up_popularity,
            )),
            Err(e) => {
                debug!("Popularity unavailable for {}: {}", model.repo_id(), e);
                None
            }
        };

        let card = ctx.model_card().await.ok();
        let prompt = ramp_up_prompt(
            &model.url,
            card.as_deref().map(|c| truncate_chars(c, ctx.config.max_prompt_chars)),
        );

        let llm = match ctx.ask_for_score(&prompt).await {
            Ok(score) => score,
            // Without popularity the judgment is the whole signal.
            Err(e) if popularity.is_none() => return Err(e),
            Err(e) => {
                debug!("Ramp-up judgment failed, counting it as 0: {}", e);
                0.0
            }
        };

        Ok(MetricValue::Score(blend(popularity, llm, ctx.config.ramp_up_popularity_share)))
    }
}
