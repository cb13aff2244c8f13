use super::*;
use crate::window::{DescendingGuard, ScanStep, StatWindow};
use anyhow::Context;
use tracing::{debug, info};

/// Pages through repository listings until the cursor runs out.
pub struct RepositoryReader<'a> {
    api: &'a dyn GitHubApi,
    window: &'a StatWindow,
}

impl<'a> RepositoryReader<'a> {
    pub fn new(api: &'a dyn GitHubApi, window: &'a StatWindow) -> Self {
        Self { api, window }
    }

    /// Every commit authored by `author` up to the window end.
    pub async fn list_commits(&self, repo: &RepoRef, author: &str) -> Result<Vec<RepoCommit>> {
        let mut commits = Vec::new();
        let mut page = 1;
        loop {
            let batch = self
                .api
                .list_commits(repo, author, self.window.end, page)
                .await
                .with_context(|| format!("Failed to list commits of {} in {}", author, repo))?;
            commits.extend(batch.items);

            match batch.next_page {
                Some(next) => page = next,
                None => break,
            }
        }
        debug!("{}: {} commits by {}", repo, commits.len(), author);
        Ok(commits)
    }

    /// Open pull requests created inside the window.
    pub async fn list_open_pull_requests(&self, repo: &RepoRef) -> Result<Vec<PullRequest>> {
        info!("{} : listing open pull requests", repo);
        self.scan_pull_requests(
            repo,
            PullState::Open,
            PullSort::Created,
            |pr| pr.created_at,
            |pr| self.window.classify_open(pr),
        )
        .await
    }

    /// Closed pull requests merged inside the window.
    pub async fn list_closed_pull_requests(&self, repo: &RepoRef) -> Result<Vec<PullRequest>> {
        info!("{} : listing closed pull requests", repo);
        self.scan_pull_requests(
            repo,
            PullState::Closed,
            PullSort::Updated,
            |pr| pr.updated_at,
            |pr| self.window.classify_closed(pr),
        )
        .await
    }

    async fn scan_pull_requests(
        &self,
        repo: &RepoRef,
        state: PullState,
        sort: PullSort,
        sort_time: impl Fn(&PullRequest) -> DateTime<Utc>,
        classify: impl Fn(&PullRequest) -> ScanStep,
    ) -> Result<Vec<PullRequest>> {
        let mut guard = DescendingGuard::new(state.as_str(), repo.to_string());
        let mut kept = Vec::new();
        let mut page = 1;

        'pages: loop {
            let batch = self
                .api
                .list_pull_requests(repo, state, sort, page)
                .await
                .with_context(|| {
                    format!("Failed to list {} pull requests of {}", state.as_str(), repo)
                })?;
            debug!("{}: {} pull requests page {} fetched", repo, state.as_str(), page);

            for pr in batch.items {
                guard.observe(sort_time(&pr))?;
                match classify(&pr) {
                    ScanStep::Keep => kept.push(pr),
                    ScanStep::Skip => {}
                    ScanStep::Stop => break 'pages,
                }
            }

            match batch.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(kept)
    }

    pub async fn list_repositories(&self, owner: &str) -> Result<Vec<RepoRef>> {
        let mut repos = Vec::new();
        let mut page = 1;
        loop {
            let batch = self
                .api
                .list_repositories(owner, page)
                .await
                .with_context(|| format!("Failed to list repositories of {}", owner))?;
            repos.extend(
                batch
                    .items
                    .into_iter()
                    .map(|r| RepoRef::new(r.owner.login, r.name)),
            );

            match batch.next_page {
                Some(next) => page = next,
                None => break,
            }
        }
        Ok(repos)
    }

    /// Replaces `owner/*` entries with the owner's repositories.
    pub async fn expand(&self, repos: &[RepoRef]) -> Result<Vec<RepoRef>> {
        let mut expanded = Vec::with_capacity(repos.len());
        for repo in repos {
            if repo.is_wildcard() {
                let owned = self.list_repositories(&repo.owner).await?;
                info!("{} expanded to {} repositories", repo, owned.len());
                expanded.extend(owned);
            } else {
                expanded.push(repo.clone());
            }
        }
        Ok(expanded)
    }
}
