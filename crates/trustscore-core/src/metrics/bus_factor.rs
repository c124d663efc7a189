//! Bus factor: how many authors carry a meaningful share of recent commits.

use super::{Metric, MetricContext, MetricKind, MetricValue};
use crate::collaborators::CommitRecord;
use crate::config::BusFactorPolicy;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::debug;

pub struct BusFactorMetric;

/// `min(1, significant_authors / saturation)` over commits at or after `since`.
///
/// An author is significant when their share of windowed commits strictly
/// exceeds the policy percentage.
pub fn bus_factor_score(commits: &[CommitRecord], since: DateTime<Utc>, policy: &BusFactorPolicy) -> f64 {
    let mut per_author: BTreeMap<&str, usize> = BTreeMap::new();
    for commit in commits.iter().filter(|c| c.timestamp >= since) {
        *per_author.entry(commit.author.as_str()).or_default() += 1;
    }

    let total: usize = per_author.values().sum();
    if total == 0 {
        return 0.0;
    }

    let significant = per_author
        .values()
        .filter(|&&count| count as f64 * 100.0 / total as f64 > policy.significance_percent)
        .count();
    debug!("{} of {} authors significant over {} commits", significant, per_author.len(), total);

    (significant as f64 / f64::from(policy.saturation_authors)).min(1.0)
}

#[async_trait]
impl Metric for BusFactorMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::BusFactor
    }

    async fn evaluate(&self, ctx: &MetricContext) -> Result<MetricValue> {
        let policy = &ctx.config.bus_factor;
        let since = ctx.started_at - Duration::days(policy.window_days);
        let commits = ctx
            .collaborators
            .host
            .fetch_commit_history(&ctx.target.model, since)
            .await?;
        Ok(MetricValue::Score(bus_factor_score(&commits, since, policy)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commits(authors: &[(&str, usize)], at: DateTime<Utc>) -> Vec<CommitRecord> {
        authors
            .iter()
            .flat_map(|(author, n)| {
                (0..*n).map(move |_| CommitRecord {
                    author: author.to_string(),
                    timestamp: at,
                })
            })
            .collect()
    }

    #[test]
    fn test_three_even_authors() {
        let now = Utc::now();
        let since = now - Duration::days(912);
        let history = commits(&[("a", 7), ("b", 7), ("c", 6)], now - Duration::days(10));
        let score = bus_factor_score(&history, since, &BusFactorPolicy::default());
        assert!((score - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_minor_authors_not_significant() {
        let now = Utc::now();
        let since = now - Duration::days(912);
        // 1 of 100 commits is 1%, below the 4% threshold.
        let history = commits(&[("lead", 99), ("drive-by", 1)], now);
        assert!((bus_factor_score(&history, since, &BusFactorPolicy::default()) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_saturates_and_ignores_old_commits() {
        let now = Utc::now();
        let since = now - Duration::days(912);
        let mut history = commits(&[("a", 5), ("b", 5), ("c", 5), ("d", 5), ("e", 5), ("f", 5)], now);
        history.extend(commits(&[("ancient", 1000)], now - Duration::days(2000)));
        assert_eq!(bus_factor_score(&history, since, &BusFactorPolicy::default()), 1.0);
    }

    #[test]
    fn test_empty_window() {
        let now = Utc::now();
        let old = commits(&[("a", 10)], now - Duration::days(5000));
        assert_eq!(bus_factor_score(&old, now - Duration::days(912), &BusFactorPolicy::default()), 0.0);
        assert_eq!(bus_factor_score(&[], now, &BusFactorPolicy::default()), 0.0);
    }
}
