use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::SortKey;
use crate::error::StatsError;

/// Pull request counters of one user within one bucket (week or overall).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestMetrics {
    pub user: String,
    /// Merged pull requests; merged ones are closed as well.
    pub merged: usize,
    /// Commits credited through the pull request that merged them.
    pub merged_commits: usize,
    /// Open pull requests carrying an approval label.
    pub lgtmed: usize,
    /// Open pull requests without an approval label.
    pub non_lgtmed: usize,
    /// Created pull requests; `None` where the bucket does not compute it.
    pub created: Option<usize>,
}

impl PullRequestMetrics {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Default::default()
        }
    }

    fn absorb(&mut self, other: &PullRequestMetrics) -> Result<(), StatsError> {
        self.created = match (self.created, other.created) {
            (Some(a), Some(b)) => Some(a + b),
            (None, None) => None,
            _ => return Err(StatsError::IncompatibleRecords(self.user.clone())),
        };
        self.merged += other.merged;
        self.merged_commits += other.merged_commits;
        self.lgtmed += other.lgtmed;
        self.non_lgtmed += other.non_lgtmed;
        Ok(())
    }
}

/// Column sums shown below a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsTotals {
    pub merged: usize,
    pub merged_commits: usize,
    pub lgtmed: usize,
    pub non_lgtmed: usize,
    pub created: Option<usize>,
}

/// Folds records of the same user into the first occurrence, keeping
/// first-seen order.
pub fn merge(records: Vec<PullRequestMetrics>) -> Result<Vec<PullRequestMetrics>, StatsError> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<PullRequestMetrics> = Vec::with_capacity(records.len());

    for record in records {
        match position.get(&record.user) {
            Some(&i) => merged[i].absorb(&record)?,
            None => {
                position.insert(record.user.clone(), merged.len());
                merged.push(record);
            }
        }
    }
    Ok(merged)
}

/// Stable, descending on the chosen counter.
pub fn sort(records: &mut [PullRequestMetrics], key: SortKey) {
    match key {
        SortKey::Unordered => {}
        SortKey::MergedPrs => records.sort_by(|a, b| b.merged.cmp(&a.merged)),
        SortKey::MergedCommits => records.sort_by(|a, b| b.merged_commits.cmp(&a.merged_commits)),
    }
}

pub fn merge_and_sort(
    records: Vec<PullRequestMetrics>,
    key: SortKey,
) -> Result<Vec<PullRequestMetrics>, StatsError> {
    let mut merged = merge(records)?;
    sort(&mut merged, key);
    Ok(merged)
}

pub fn totals(records: &[PullRequestMetrics]) -> MetricsTotals {
    records.iter().fold(
        MetricsTotals {
            created: records.first().and_then(|r| r.created.map(|_| 0)),
            ..Default::default()
        },
        |mut acc, r| {
            acc.merged += r.merged;
            acc.merged_commits += r.merged_commits;
            acc.lgtmed += r.lgtmed;
            acc.non_lgtmed += r.non_lgtmed;
            acc.created = acc.created.zip(r.created).map(|(a, b)| a + b);
            acc
        },
    )
}
