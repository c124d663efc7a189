//! License compatibility.

use super::{Metric, MetricContext, MetricKind, MetricValue};
use crate::card::{license_matches, license_section};
use crate::config::HubConfig;
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

/// Declared license, then a LICENSE file, then the card's License section.
pub struct LicenseMetric;

/// A declared identifier matches when it equals an allow-list entry or
/// refines one (`bsd-3-clause` refines `bsd`, `lgpl-2.1` refines `lgpl`).
pub(crate) fn declared_license_allowed(declared: &[String], allow_list: &[String]) -> bool {
    declared.iter().any(|license| {
        let license = license.trim().to_lowercase();
        allow_list.iter().any(|allowed| {
            let allowed = allowed.to_lowercase();
            license == allowed
                || license
                    .strip_prefix(allowed.as_str())
                    .is_some_and(|rest| rest.starts_with(['-', '.']))
        })
    })
}

#[async_trait]
impl Metric for LicenseMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::License
    }

    async fn evaluate(&self, ctx: &MetricContext) -> Result<MetricValue> {
        let allow_list = &ctx.config.license_allow_list;
        let host = &ctx.collaborators.host;
        let model = &ctx.target.model;

        match host.fetch_manifest(model).await {
            Ok(manifest) if declared_license_allowed(&manifest.declared_licenses, allow_list) => {
                return Ok(MetricValue::Score(1.0));
            }
            Ok(manifest) => debug!("Declared licenses {:?} not allowed", manifest.declared_licenses),
            Err(e) => debug!("No manifest for {}: {}", model.repo_id(), e),
        }

        match host.fetch_text_file(model, HubConfig::LICENSE_FILENAME).await {
            Ok(text) if license_matches(&text, allow_list) => return Ok(MetricValue::Score(1.0)),
            Ok(_) => debug!("LICENSE file of {} names no allowed license", model.repo_id()),
            Err(e) => debug!("No LICENSE file for {}: {}", model.repo_id(), e),
        }

        let card = ctx.model_card().await?;
        let allowed = license_section(&card).is_some_and(|section| license_matches(section, allow_list));
        Ok(MetricValue::Score(if allowed { 1.0 } else { 0.0 }))
    }
}
