use chrono::{DateTime, Utc};
use thiserror::Error;

/// Domain failures that are not transport errors.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("invalid repository entry '{0}', expected owner/name")]
    InvalidRepository(String),

    #[error("stat begin time {begin} is not before stat end time {end}")]
    InvalidWindow {
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("no approval label event found for {repo}#{number}")]
    NoApprovalEvent { repo: String, number: u64 },

    #[error(
        "{listing} listing for {repo} is not in descending order ({current} follows {previous})"
    )]
    UnorderedListing {
        listing: &'static str,
        repo: String,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("metric records for user '{0}' mix computed and not-computed counters")]
    IncompatibleRecords(String),
}
