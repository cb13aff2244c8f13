use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use crate::commits::CommitCorrelator;
use crate::config::Config;
use crate::github::{GitHubApi, PullRequest, RepoRef, RepositoryReader};
use crate::metrics::{merge_and_sort, PullRequestMetrics};
use crate::review::ReviewDetector;
use crate::window::StatWindow;

/// Merged and ranked metric collections of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityReport {
    pub window: StatWindow,
    pub repositories: Vec<RepoRef>,
    /// `None` when weekly statistics were not computed.
    pub week: Option<Vec<PullRequestMetrics>>,
    pub overall: Vec<PullRequestMetrics>,
}

/// Raw records of one user in one repository.
#[derive(Debug)]
struct UserActivity {
    overall: PullRequestMetrics,
    week: Option<PullRequestMetrics>,
}

/// Walks every configured repository and user in sequence.
pub struct ActivityAnalyzer<'a> {
    api: &'a dyn GitHubApi,
    config: &'a Config,
    window: StatWindow,
}

impl<'a> ActivityAnalyzer<'a> {
    pub fn new(api: &'a dyn GitHubApi, config: &'a Config, window: StatWindow) -> Self {
        Self {
            api,
            config,
            window,
        }
    }

    pub async fn analyze(&self) -> Result<ActivityReport> {
        let reader = RepositoryReader::new(self.api, &self.window);
        let repositories = reader.expand(&self.config.repositories()?).await?;

        if !self.window.week_enabled() {
            info!("Week statistics disabled because stat end time is specified");
        }

        let pb = ProgressBar::new((repositories.len() * self.config.users.len()) as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
        );

        let mut overall = Vec::new();
        let mut week = Vec::new();

        for repo in &repositories {
            let open = reader.list_open_pull_requests(repo).await?;
            let closed = reader.list_closed_pull_requests(repo).await?;
            info!(
                "{}: {} open and {} merged pull requests inside the window",
                repo,
                open.len(),
                closed.len()
            );

            for user in &self.config.users {
                pb.set_message(format!("{} {}", repo, user.name));
                let activity = self.user_activity(repo, &user.name, &open, &closed).await?;
                overall.push(activity.overall);
                week.extend(activity.week);
                pb.inc(1);
            }
        }
        pb.finish_and_clear();

        let sort = self.config.sort;
        let week = if self.window.week_enabled() {
            Some(merge_and_sort(week, sort)?)
        } else {
            None
        };

        Ok(ActivityReport {
            window: self.window,
            repositories,
            week,
            overall: merge_and_sort(overall, sort)?,
        })
    }

    async fn user_activity(
        &self,
        repo: &RepoRef,
        login: &str,
        open: &[PullRequest],
        closed: &[PullRequest],
    ) -> Result<UserActivity> {
        let window = &self.window;
        let week_enabled = window.week_enabled();
        let correlator = CommitCorrelator::new(self.api, window);
        let detector = ReviewDetector::new(self.api, window);

        let mut overall = PullRequestMetrics::new(login);
        let mut week = PullRequestMetrics::new(login);
        let mut week_created = 0;

        let commits = correlator.merged_commits(repo, login).await?;
        overall.merged_commits = commits.len();
        week.merged_commits = commits
            .iter()
            .filter(|c| c.merged_at.is_some_and(|t| window.in_this_week(t)))
            .count();

        for pr in open.iter().filter(|pr| pr.opened_by(login)) {
            let created_this_week = window.in_this_week(pr.created_at);
            if created_this_week {
                week_created += 1;
            }

            if detector.is_approved(repo, pr.number).await? {
                overall.lgtmed += 1;
                if week_enabled {
                    let event = detector.latest_approval_event(repo, pr.number).await?;
                    if window.in_this_week(event.created_at) {
                        week.lgtmed += 1;
                    }
                }
            } else {
                overall.non_lgtmed += 1;
                if created_this_week {
                    week.non_lgtmed += 1;
                }
            }
        }

        for listed in closed.iter().filter(|pr| pr.opened_by(login) && pr.is_merged()) {
            // list results lack fields such as the commit count
            let pr = self
                .api
                .get_pull_request(repo, listed.number)
                .await
                .with_context(|| format!("Failed to fetch {}#{}", repo, listed.number))?;
            debug!(
                "{}#{} '{}' merged with {} commits",
                repo,
                pr.number,
                pr.title,
                pr.commits.unwrap_or_default()
            );

            overall.merged += 1;
            if pr.merged_at.is_some_and(|t| window.in_this_week(t)) {
                week.merged += 1;
            }
            if window.in_this_week(pr.created_at) {
                week_created += 1;
            }
        }

        week.created = Some(week_created);

        Ok(UserActivity {
            overall,
            week: week_enabled.then_some(week),
        })
    }
}
