use anyhow::{Context, Result};
use tracing::debug;

use crate::error::StatsError;
use crate::github::{GitHubApi, IssueEvent, RepoRef};
use crate::window::StatWindow;

/// Labels that signal review sign-off, compared case-insensitively.
pub const APPROVAL_LABELS: [&str; 3] = ["LGTM", "Docs LGTM", "Tech Review LGTM"];

pub fn is_approval_label(name: &str) -> bool {
    APPROVAL_LABELS
        .iter()
        .any(|label| label.eq_ignore_ascii_case(name))
}

pub struct ReviewDetector<'a> {
    api: &'a dyn GitHubApi,
    window: &'a StatWindow,
}

impl<'a> ReviewDetector<'a> {
    pub fn new(api: &'a dyn GitHubApi, window: &'a StatWindow) -> Self {
        Self { api, window }
    }

    pub async fn is_approved(&self, repo: &RepoRef, number: u64) -> Result<bool> {
        let issue = self
            .api
            .get_issue(repo, number)
            .await
            .with_context(|| format!("Failed to fetch labels of {}#{}", repo, number))?;
        Ok(issue.labels.iter().any(|l| is_approval_label(&l.name)))
    }

    /// Most recent approval labeling seen before the scan reaches events
    /// older than the window start.
    pub async fn latest_approval_event(&self, repo: &RepoRef, number: u64) -> Result<IssueEvent> {
        let mut latest: Option<IssueEvent> = None;
        let mut page = 1;

        loop {
            let batch = self
                .api
                .list_issue_events(repo, number, page)
                .await
                .with_context(|| format!("Failed to list events of {}#{}", repo, number))?;
            let reached_begin = batch
                .items
                .last()
                .is_some_and(|e| self.window.is_before_begin(e.created_at));

            for event in batch.items {
                let approves = event.event == "labeled"
                    && event.label.as_ref().is_some_and(|l| is_approval_label(&l.name));
                if approves && latest.as_ref().map_or(true, |l| event.created_at > l.created_at) {
                    latest = Some(event);
                }
            }

            match batch.next_page {
                Some(next) if !reached_begin => page = next,
                _ => break,
            }
        }

        debug!("{}#{}: latest approval {:?}", repo, number, latest.as_ref().map(|e| e.created_at));
        latest.ok_or_else(|| {
            StatsError::NoApprovalEvent {
                repo: repo.to_string(),
                number,
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::{labeled, ts, window_from, MockGitHub};
    use crate::github::Label;
    use std::collections::HashMap;

    fn repo() -> RepoRef {
        RepoRef::new("pingcap", "docs")
    }

    #[test]
    fn approval_labels_ignore_case() {
        assert!(is_approval_label("lgtm"));
        assert!(is_approval_label("docs lgtm"));
        assert!(is_approval_label("TECH REVIEW LGTM"));
        assert!(!is_approval_label("needs-review"));
        assert!(!is_approval_label("LGTM2"));
        assert!(!is_approval_label("LGTM "));
        assert!(!is_approval_label(" docs lgtm"));
    }

    #[tokio::test]
    async fn detects_approval_label() {
        let github = MockGitHub {
            labels: HashMap::from([
                (1, vec!["translation".to_string(), "Docs LGTM".to_string()]),
                (2, vec!["translation".to_string()]),
            ]),
            ..Default::default()
        };
        let window = window_from("2023-01-01");
        let detector = ReviewDetector::new(&github, &window);

        assert!(detector.is_approved(&repo(), 1).await.unwrap());
        assert!(!detector.is_approved(&repo(), 2).await.unwrap());
        assert!(!detector.is_approved(&repo(), 3).await.unwrap());
    }

    #[tokio::test]
    async fn picks_most_recent_approval_event() {
        let unlabeled = IssueEvent {
            event: "unlabeled".to_string(),
            label: Some(Label {
                name: "LGTM".to_string(),
            }),
            created_at: ts("2023-03-15T00:00:00Z"),
        };
        let github = MockGitHub {
            page_size: 2,
            events: HashMap::from([(
                5,
                vec![
                    labeled("LGTM", "2023-02-01T00:00:00Z"),
                    labeled("needs-review", "2023-02-05T00:00:00Z"),
                    labeled("tech review lgtm", "2023-03-14T09:00:00Z"),
                    unlabeled,
                ],
            )]),
            ..Default::default()
        };
        let window = window_from("2023-01-01");
        let detector = ReviewDetector::new(&github, &window);

        let event = detector.latest_approval_event(&repo(), 5).await.unwrap();
        assert_eq!(event.created_at, ts("2023-03-14T09:00:00Z"));
    }

    #[tokio::test]
    async fn stops_paging_once_events_predate_window() {
        let github = MockGitHub {
            page_size: 1,
            events: HashMap::from([(
                5,
                vec![
                    labeled("needs-review", "2022-12-01T00:00:00Z"),
                    labeled("LGTM", "2023-02-01T00:00:00Z"),
                ],
            )]),
            ..Default::default()
        };
        let window = window_from("2023-01-01");
        let detector = ReviewDetector::new(&github, &window);

        let err = detector.latest_approval_event(&repo(), 5).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StatsError>(),
            Some(StatsError::NoApprovalEvent { number: 5, .. })
        ));
    }
}
