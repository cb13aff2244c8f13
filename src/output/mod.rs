use serde::Serialize;

pub mod reporter;
pub mod table;

pub use reporter::Reporter;

use crate::analysis::ActivityReport;
use crate::config::Config;
use crate::metrics::{totals, MetricsTotals, PullRequestMetrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputFormat {
    Table,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" | "text" => OutputFormat::Table,
            _ => OutputFormat::Table,
        }
    }
}

pub fn add_file_extension(path: &str, format: &OutputFormat) -> String {
    let extension = match format {
        OutputFormat::Table => ".txt",
        OutputFormat::Json => ".json",
    };

    if path.ends_with(extension) {
        path.to_string()
    } else {
        format!("{}{}", path, extension)
    }
}

/// `login(Real Name)` when a real name is configured.
pub fn display_user(config: &Config, login: &str) -> String {
    match config.real_name(login) {
        Some(real_name) => format!("{}({})", login, real_name),
        None => login.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct Section<'a> {
    rows: &'a [PullRequestMetrics],
    totals: MetricsTotals,
}

impl<'a> Section<'a> {
    fn new(rows: &'a [PullRequestMetrics]) -> Self {
        Self {
            rows,
            totals: totals(rows),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    window: &'a crate::window::StatWindow,
    repositories: Vec<String>,
    week: Option<Section<'a>>,
    overall: Section<'a>,
}

pub fn to_json(report: &ActivityReport) -> serde_json::Result<String> {
    let json = JsonReport {
        window: &report.window,
        repositories: report.repositories.iter().map(|r| r.to_string()).collect(),
        week: report.week.as_deref().map(Section::new),
        overall: Section::new(&report.overall),
    };
    serde_json::to_string_pretty(&json)
}
