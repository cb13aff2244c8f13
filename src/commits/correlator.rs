use super::*;
use crate::github::{GitHubApi, PullRequest, RepositoryReader};
use crate::window::StatWindow;
use anyhow::Result;
use tracing::{debug, warn};

/// Which identity of a commit is matched against pull request authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Author,
    Committer,
}

/// Finds the pull request that merged a commit through issue search.
pub struct CommitCorrelator<'a> {
    api: &'a dyn GitHubApi,
    window: &'a StatWindow,
}

impl<'a> CommitCorrelator<'a> {
    pub fn new(api: &'a dyn GitHubApi, window: &'a StatWindow) -> Self {
        Self { api, window }
    }

    /// Commits of `login` whose pull request was merged inside the window.
    pub async fn merged_commits(&self, repo: &RepoRef, login: &str) -> Result<Vec<CorrelatedCommit>> {
        let reader = RepositoryReader::new(self.api, self.window);
        let commits = filter_merge_noise(reader.list_commits(repo, login).await?);

        let mut merged = Vec::new();
        for commit in commits {
            let mut correlated = CorrelatedCommit::new(repo.clone(), commit);
            self.correlate(&mut correlated).await?;

            match correlated.merged_at {
                Some(at) if self.window.in_stat_window(at) => merged.push(correlated),
                _ => {}
            }
        }
        debug!("{}: {} merged commits credited to {}", repo, merged.len(), login);
        Ok(merged)
    }

    /// Sets `merged_at` from the author's pull request, falling back to the
    /// committer's. A commit without any match keeps `merged_at` empty.
    pub async fn correlate(&self, commit: &mut CorrelatedCommit) -> Result<()> {
        for identity in [Identity::Author, Identity::Committer] {
            let login = match identity {
                Identity::Author => commit.commit.author_login(),
                Identity::Committer => commit.commit.committer_login(),
            };
            let Some(login) = login else {
                continue;
            };

            if let Some(pr) = self.find_pull_request(&commit.repo, login, commit.sha()).await? {
                commit.merged_at = pr.merged_at;
                return Ok(());
            }
        }
        Ok(())
    }

    /// Search failures and empty results are "not found"; fetching the
    /// matched pull request must succeed.
    pub async fn find_pull_request(
        &self,
        repo: &RepoRef,
        login: &str,
        sha: &str,
    ) -> Result<Option<PullRequest>> {
        let query = search_query(repo, login, sha);

        let results = match self.api.search_issues(&query).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Pull request search failed for '{}': {:#}", query, e);
                return Ok(None);
            }
        };

        if let Some(rate) = results.rate {
            if let Some(wait) = rate.wait_duration(Utc::now()) {
                warn!(
                    "Search rate limit of {} exhausted, sleeping {}s until the next window",
                    rate.limit,
                    wait.as_secs()
                );
                tokio::time::sleep(wait).await;
            }
        }

        // total_count can disagree with the returned page, the items decide.
        let Some(first) = results.items.first() else {
            warn!("No pull request found for commit {} (query '{}')", sha, query);
            return Ok(None);
        };
        if results.items.len() > 1 || results.total_count > 1 {
            warn!(
                "{} pull requests match commit {}, taking #{} (query '{}')",
                results.total_count.max(results.items.len() as u64),
                sha,
                first.number,
                query
            );
        }

        let pr = self.api.get_pull_request(repo, first.number).await?;
        Ok(Some(pr))
    }
}

pub fn search_query(repo: &RepoRef, login: &str, sha: &str) -> String {
    format!("{} repo:{} type:pr author:{}", sha, repo, login)
}
