use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StatsError;

pub mod client;
pub mod reader;
#[cfg(test)]
pub(crate) mod testing;

pub use client::RestClient;
pub use reader::RepositoryReader;

/// Wildcard repository name meaning "every repository of the owner".
pub const ALL_REPOSITORIES: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn parse(entry: &str) -> Result<Self, StatsError> {
        match entry.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(StatsError::InvalidRepository(entry.to_string())),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == ALL_REPOSITORIES
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetail {
    pub message: String,
}

/// A commit as returned by the commit listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoCommit {
    pub sha: String,
    pub commit: CommitDetail,
    /// `None` when the git author is not linked to a GitHub account.
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub committer: Option<User>,
}

impl RepoCommit {
    pub fn message(&self) -> &str {
        &self.commit.message
    }

    pub fn author_login(&self) -> Option<&str> {
        self.author.as_ref().map(|u| u.login.as_str())
    }

    pub fn committer_login(&self) -> Option<&str> {
        self.committer.as_ref().map(|u| u.login.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub user: Option<User>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    /// Only present on single pull request responses.
    #[serde(default)]
    pub commits: Option<u32>,
}

impl PullRequest {
    pub fn opened_by(&self, login: &str) -> bool {
        self.user.as_ref().is_some_and(|u| u.login == login)
    }

    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueEvent {
    pub event: String,
    #[serde(default)]
    pub label: Option<Label>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: u32,
    pub remaining: u32,
    pub reset: DateTime<Utc>,
}

impl RateLimit {
    /// How long to block before the next call, if the window is exhausted.
    pub fn wait_duration(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        if self.remaining > 0 {
            return None;
        }
        (self.reset - now)
            .to_std()
            .ok()
            .filter(|wait| !wait.is_zero())
    }
}

#[derive(Debug, Clone)]
pub struct SearchResults {
    pub total_count: u64,
    pub items: Vec<Issue>,
    pub rate: Option<RateLimit>,
}

/// One page of a listing plus the cursor of the following page.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullState {
    Open,
    Closed,
}

impl PullState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullState::Open => "open",
            PullState::Closed => "closed",
        }
    }
}

/// Field a pull request listing is sorted on, always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullSort {
    Created,
    Updated,
}

impl PullSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullSort::Created => "created",
            PullSort::Updated => "updated",
        }
    }
}

/// Remote operations the statistics engine consumes.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn list_commits(
        &self,
        repo: &RepoRef,
        author: &str,
        until: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<RepoCommit>>;

    async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        state: PullState,
        sort: PullSort,
        page: u32,
    ) -> Result<Page<PullRequest>>;

    async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest>;

    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<Issue>;

    async fn list_issue_events(
        &self,
        repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<IssueEvent>>;

    async fn search_issues(&self, query: &str) -> Result<SearchResults>;

    async fn list_repositories(&self, owner: &str, page: u32) -> Result<Page<Repository>>;
}
