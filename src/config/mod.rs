use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::StatsError;
use crate::github::RepoRef;

pub const DEFAULT_CONFIG_FILE: &str = "pullstats.toml";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
const ENV_PREFIX: &str = "PULLSTATS";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_time")]
    pub stat_begin_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub stat_end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub this_week_first_day: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub users: Vec<UserConfig>,
    #[serde(default)]
    pub repos: Vec<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserConfig {
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
}

/// Ranking applied to metric collections after merging.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String")]
pub enum SortKey {
    #[default]
    Unordered,
    MergedPrs,
    MergedCommits,
}

impl From<&str> for SortKey {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "merged_prs" | "mergedprs" | "merged" => SortKey::MergedPrs,
            "merged_commits" | "mergedcommits" | "commits" => SortKey::MergedCommits,
            _ => SortKey::Unordered,
        }
    }
}

impl From<String> for SortKey {
    fn from(s: String) -> Self {
        SortKey::from(s.as_str())
    }
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub stat_begin_time: Option<String>,
    pub stat_end_time: Option<String>,
    pub sort: Option<String>,
    pub token: Option<String>,
}

impl Config {
    /// Layers the TOML file, `PULLSTATS_*` environment variables and CLI overrides.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path)
                .format(config::FileFormat::Toml)
                .required(true),
            None => config::File::new(DEFAULT_CONFIG_FILE, config::FileFormat::Toml)
                .required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("stat_begin_time", overrides.stat_begin_time.clone())?
            .set_override_option("stat_end_time", overrides.stat_end_time.clone())?
            .set_override_option("sort", overrides.sort.clone())?
            .set_override_option("token", overrides.token.clone())?
            .build()
            .context("Failed to read configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(end) = self.stat_end_time {
            if self.stat_begin_time >= end {
                return Err(StatsError::InvalidWindow {
                    begin: self.stat_begin_time,
                    end,
                }
                .into());
            }
        }
        self.repositories()?;
        Ok(())
    }

    pub fn repositories(&self) -> Result<Vec<RepoRef>> {
        self.repos
            .iter()
            .map(|entry| Ok(RepoRef::parse(entry)?))
            .collect()
    }

    /// Monday 00:00 UTC of the week containing `now`, unless configured.
    pub fn week_first_day(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.this_week_first_day.unwrap_or_else(|| {
            let days_from_monday = now.weekday().num_days_from_monday() as i64;
            let monday = now.date_naive() - Duration::days(days_from_monday);
            monday.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
        })
    }

    pub fn real_name(&self, login: &str) -> Option<&str> {
        self.users
            .iter()
            .find(|u| u.name == login)
            .and_then(|u| u.real_name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` or a bare date (midnight UTC).
pub fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(t.and_utc());
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Unrecognised time '{}'", value))?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
}

fn deserialize_time<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_time(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_optional_time<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_time(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[cfg(test)]
pub(crate) fn test_config(begin: &str) -> Config {
    Config {
        stat_begin_time: parse_time(begin).expect("begin"),
        stat_end_time: None,
        this_week_first_day: None,
        sort: SortKey::Unordered,
        users: Vec::new(),
        repos: Vec::new(),
        token: None,
        api_url: DEFAULT_API_URL.to_string(),
        proxy: None,
    }
}
