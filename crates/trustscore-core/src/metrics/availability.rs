use super::{Metric, MetricContext, MetricKind, MetricValue};
use crate::error::Result;
use async_trait::async_trait;

/// Mean of the dataset and code availability flags.
pub struct DatasetAndCodeMetric;

#[async_trait]
impl Metric for DatasetAndCodeMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::DatasetAndCodeScore
    }

    async fn evaluate(&self, ctx: &MetricContext) -> Result<MetricValue> {
        let target = &ctx.target;
        Ok(MetricValue::Score(
            (target.dataset_availability() + target.code_availability()) / 2.0,
        ))
    }
}
