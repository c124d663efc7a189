//! Size fit per deployment device.

use super::{Metric, MetricContext, MetricKind, MetricValue};
use crate::config::{DeviceClass, ScoringConfig};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub struct SizeMetric;

/// 1.0 when `size` fits within the device limit, falling linearly to zero
/// at twice the limit. Devices without a limit always score 1.0.
pub fn device_fit(size: u64, device: &DeviceClass) -> f64 {
    match device.max_bytes {
        None => 1.0,
        Some(limit) if size <= limit => 1.0,
        Some(limit) => {
            let limit = limit as f64;
            ((2.0 * limit - size as f64) / limit).max(0.0)
        }
    }
}

/// Per-device fit for an artifact of `size` bytes.
pub fn size_scores(size: u64, devices: &[DeviceClass]) -> BTreeMap<String, f64> {
    devices
        .iter()
        .map(|device| (device.name.clone(), device_fit(size, device)))
        .collect()
}

#[async_trait]
impl Metric for SizeMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::SizeScore
    }

    /// Every device at zero.
    fn safe_default(&self, config: &ScoringConfig) -> MetricValue {
        MetricValue::ByDevice(config.devices.iter().map(|d| (d.name.clone(), 0.0)).collect())
    }

    async fn evaluate(&self, ctx: &MetricContext) -> Result<MetricValue> {
        let manifest = ctx.collaborators.host.fetch_manifest(&ctx.target.model).await?;
        Ok(MetricValue::ByDevice(size_scores(manifest.total_size(), &ctx.config.devices)))
    }
}
