//! In-memory stand-in for the GitHub API used by unit tests.

use super::*;
use crate::window::StatWindow;
use anyhow::anyhow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

pub(crate) fn ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .expect("rfc3339 timestamp")
        .with_timezone(&Utc)
}

/// Window starting at `begin`, "now" being Thursday 2023-03-16 noon.
pub(crate) fn window_from(begin: &str) -> StatWindow {
    StatWindow {
        begin: ts(&format!("{begin}T00:00:00Z")),
        end: None,
        week_first_day: ts("2023-03-13T00:00:00Z"),
        now: ts("2023-03-16T12:00:00Z"),
    }
}

pub(crate) fn commit(sha: &str, author: &str, committer: &str, message: &str) -> RepoCommit {
    RepoCommit {
        sha: sha.to_string(),
        commit: CommitDetail {
            message: message.to_string(),
        },
        author: Some(User {
            login: author.to_string(),
        }),
        committer: Some(User {
            login: committer.to_string(),
        }),
    }
}

pub(crate) fn pull_request(number: u64, login: &str, created: &str) -> PullRequest {
    PullRequest {
        number,
        title: format!("pull request {number}"),
        user: Some(User {
            login: login.to_string(),
        }),
        created_at: ts(created),
        updated_at: ts(created),
        merged_at: None,
        commits: None,
    }
}

impl PullRequest {
    pub(crate) fn merged(mut self, at: &str) -> Self {
        self.merged_at = Some(ts(at));
        if self.updated_at < ts(at) {
            self.updated_at = ts(at);
        }
        self
    }

    pub(crate) fn updated(mut self, at: &str) -> Self {
        self.updated_at = ts(at);
        self
    }

    pub(crate) fn with_commits(mut self, commits: u32) -> Self {
        self.commits = Some(commits);
        self
    }
}

pub(crate) fn labeled(label: &str, at: &str) -> IssueEvent {
    IssueEvent {
        event: "labeled".to_string(),
        label: Some(Label {
            name: label.to_string(),
        }),
        created_at: ts(at),
    }
}

#[derive(Default)]
pub(crate) struct MockGitHub {
    /// Items per page, zero puts everything on one page.
    pub page_size: usize,
    pub commits: Vec<RepoCommit>,
    pub open_pulls: Vec<PullRequest>,
    pub closed_pulls: Vec<PullRequest>,
    /// Full pull requests served by number, preferred over the listings.
    pub pulls: HashMap<u64, PullRequest>,
    pub labels: HashMap<u64, Vec<String>>,
    pub events: HashMap<u64, Vec<IssueEvent>>,
    /// `(sha, author)` to the pull request numbers a search returns.
    pub search_hits: HashMap<(String, String), Vec<u64>>,
    pub rate: Option<RateLimit>,
    pub repositories: Vec<String>,
    pub fail_search: bool,
    pub fail_listings: bool,
    pub searches: Mutex<Vec<String>>,
    pub pull_pages: AtomicU32,
}

impl MockGitHub {
    pub(crate) fn hit(mut self, sha: &str, author: &str, numbers: &[u64]) -> Self {
        self.search_hits
            .insert((sha.to_string(), author.to_string()), numbers.to_vec());
        self
    }

    pub(crate) fn pull_pages_requested(&self) -> u32 {
        self.pull_pages.load(Ordering::SeqCst)
    }

    pub(crate) fn search_log(&self) -> Vec<String> {
        self.searches.lock().expect("lock").clone()
    }

    fn paginate<T: Clone>(&self, items: &[T], page: u32) -> Page<T> {
        if self.page_size == 0 {
            return Page {
                items: items.to_vec(),
                next_page: None,
            };
        }
        let start = (page as usize - 1) * self.page_size;
        let end = (start + self.page_size).min(items.len());
        Page {
            items: items.get(start..end).unwrap_or_default().to_vec(),
            next_page: (end < items.len()).then_some(page + 1),
        }
    }

    fn check_listing(&self) -> Result<()> {
        if self.fail_listings {
            return Err(anyhow!("connection reset by peer"));
        }
        Ok(())
    }
}

#[async_trait]
impl GitHubApi for MockGitHub {
    async fn list_commits(
        &self,
        _repo: &RepoRef,
        author: &str,
        _until: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Page<RepoCommit>> {
        self.check_listing()?;
        let authored: Vec<_> = self
            .commits
            .iter()
            .filter(|c| c.author_login() == Some(author))
            .cloned()
            .collect();
        Ok(self.paginate(&authored, page))
    }

    async fn list_pull_requests(
        &self,
        _repo: &RepoRef,
        state: PullState,
        _sort: PullSort,
        page: u32,
    ) -> Result<Page<PullRequest>> {
        self.check_listing()?;
        self.pull_pages.fetch_add(1, Ordering::SeqCst);
        let source = match state {
            PullState::Open => &self.open_pulls,
            PullState::Closed => &self.closed_pulls,
        };
        Ok(self.paginate(source, page))
    }

    async fn get_pull_request(&self, _repo: &RepoRef, number: u64) -> Result<PullRequest> {
        self.check_listing()?;
        self.pulls
            .get(&number)
            .or_else(|| {
                self.closed_pulls
                    .iter()
                    .chain(self.open_pulls.iter())
                    .find(|p| p.number == number)
            })
            .cloned()
            .ok_or_else(|| anyhow!("pull request {} not found", number))
    }

    async fn get_issue(&self, _repo: &RepoRef, number: u64) -> Result<Issue> {
        self.check_listing()?;
        let labels = self
            .labels
            .get(&number)
            .map(|names| {
                names
                    .iter()
                    .map(|name| Label { name: name.clone() })
                    .collect()
            })
            .unwrap_or_default();
        Ok(Issue { number, labels })
    }

    async fn list_issue_events(
        &self,
        _repo: &RepoRef,
        number: u64,
        page: u32,
    ) -> Result<Page<IssueEvent>> {
        self.check_listing()?;
        let events = self.events.get(&number).cloned().unwrap_or_default();
        Ok(self.paginate(&events, page))
    }

    async fn search_issues(&self, query: &str) -> Result<SearchResults> {
        self.searches.lock().expect("lock").push(query.to_string());
        if self.fail_search {
            return Err(anyhow!("search is unavailable"));
        }

        let sha = query.split_whitespace().next().unwrap_or_default();
        let author = query
            .split_whitespace()
            .find_map(|token| token.strip_prefix("author:"))
            .unwrap_or_default();
        let numbers = self
            .search_hits
            .get(&(sha.to_string(), author.to_string()))
            .cloned()
            .unwrap_or_default();

        Ok(SearchResults {
            total_count: numbers.len() as u64,
            items: numbers
                .into_iter()
                .map(|number| Issue {
                    number,
                    labels: Vec::new(),
                })
                .collect(),
            rate: self.rate,
        })
    }

    async fn list_repositories(&self, owner: &str, page: u32) -> Result<Page<Repository>> {
        self.check_listing()?;
        let repos: Vec<_> = self
            .repositories
            .iter()
            .map(|name| Repository {
                name: name.clone(),
                owner: User {
                    login: owner.to_string(),
                },
            })
            .collect();
        Ok(self.paginate(&repos, page))
    }
}
