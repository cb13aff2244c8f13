use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::github::{RepoCommit, RepoRef};

pub mod correlator;

pub use correlator::CommitCorrelator;

/// Message prefix of the bookkeeping commits produced by syncing master.
pub const MERGE_NOISE_PREFIX: &str = "Merge branch 'master' into";

/// A commit together with the merge time of the pull request that landed it.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelatedCommit {
    pub repo: RepoRef,
    pub commit: RepoCommit,
    pub merged_at: Option<DateTime<Utc>>,
}

impl CorrelatedCommit {
    pub fn new(repo: RepoRef, commit: RepoCommit) -> Self {
        Self {
            repo,
            commit,
            merged_at: None,
        }
    }

    pub fn sha(&self) -> &str {
        &self.commit.sha
    }
}

/// Drops synthetic merge commits, keeping the order of everything else.
pub fn filter_merge_noise(commits: Vec<RepoCommit>) -> Vec<RepoCommit> {
    commits
        .into_iter()
        .filter(|c| !c.message().starts_with(MERGE_NOISE_PREFIX))
        .collect()
}
