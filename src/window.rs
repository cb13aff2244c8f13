use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::error::StatsError;
use crate::github::PullRequest;

/// Time bounds of a run: the statistics window and the current week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatWindow {
    pub begin: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub week_first_day: DateTime<Utc>,
    pub now: DateTime<Utc>,
}

/// What a descending listing scan should do with one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStep {
    Keep,
    Skip,
    Stop,
}

impl StatWindow {
    pub fn from_config(config: &Config, now: DateTime<Utc>) -> Self {
        Self {
            begin: config.stat_begin_time,
            end: config.stat_end_time,
            week_first_day: config.week_first_day(now),
            now,
        }
    }

    /// `[begin, end)`, open-ended when no end is configured.
    pub fn in_stat_window(&self, t: DateTime<Utc>) -> bool {
        t >= self.begin && self.end.map_or(true, |end| t < end)
    }

    pub fn in_this_week(&self, t: DateTime<Utc>) -> bool {
        t >= self.week_first_day && t <= self.now
    }

    /// Weekly figures only make sense for runs that reach up to now.
    pub fn week_enabled(&self) -> bool {
        self.end.is_none()
    }

    pub fn is_before_begin(&self, t: DateTime<Utc>) -> bool {
        t < self.begin
    }

    /// Open pull requests arrive newest-created first.
    pub fn classify_open(&self, pr: &PullRequest) -> ScanStep {
        let created = pr.created_at;
        if self.end.is_some_and(|end| created >= end) {
            ScanStep::Skip
        } else if created >= self.begin {
            ScanStep::Keep
        } else {
            ScanStep::Stop
        }
    }

    /// Closed pull requests arrive newest-updated first but are windowed on
    /// merge time. Merge never happens after the last update, so an update
    /// before `begin` ends the scan.
    pub fn classify_closed(&self, pr: &PullRequest) -> ScanStep {
        let Some(merged_at) = pr.merged_at else {
            return ScanStep::Skip;
        };
        if pr.updated_at < self.begin {
            ScanStep::Stop
        } else if self.in_stat_window(merged_at) {
            ScanStep::Keep
        } else {
            ScanStep::Skip
        }
    }
}

/// Asserts a listing that is cut short really is sorted newest first.
#[derive(Debug)]
pub struct DescendingGuard {
    listing: &'static str,
    repo: String,
    previous: Option<DateTime<Utc>>,
}

impl DescendingGuard {
    pub fn new(listing: &'static str, repo: impl Into<String>) -> Self {
        Self {
            listing,
            repo: repo.into(),
            previous: None,
        }
    }

    pub fn observe(&mut self, current: DateTime<Utc>) -> Result<(), StatsError> {
        if let Some(previous) = self.previous {
            if current > previous {
                return Err(StatsError::UnorderedListing {
                    listing: self.listing,
                    repo: self.repo.clone(),
                    previous,
                    current,
                });
            }
        }
        self.previous = Some(current);
        Ok(())
    }
}
