use colored::*;
use prettytable::{format, Cell, Row, Table};
use std::fmt::Write;

use super::display_user;
use crate::analysis::ActivityReport;
use crate::config::Config;
use crate::metrics::{totals, PullRequestMetrics};

const WEEK_HEADERS: [&str; 6] = [
    "User Name",
    "Merged PRs",
    "Merged Commits",
    "LGTM'ed PRs",
    "NonLGTM'ed PRs",
    "Created PRs",
];

/// Both collections as text tables, week first.
pub fn render(report: &ActivityReport, config: &Config) -> String {
    let mut out = String::new();
    let window = &report.window;

    match &report.week {
        None => {
            out.push_str("Week statistics is disabled because stat end time is specified\n");
        }
        Some(week) if !week.is_empty() => {
            let _ = writeln!(
                out,
                "\n{} (week first day: {})",
                "Statistics for this Week".bright_cyan().bold(),
                window.week_first_day
            );
            out.push_str(&render_rows(&WEEK_HEADERS, week, config, true));
        }
        Some(_) => {}
    }

    if !report.overall.is_empty() {
        let end = window.end.unwrap_or(window.now);
        let _ = writeln!(
            out,
            "\n{} ({} ~ {})",
            "Overall Statistics".bright_cyan().bold(),
            window.begin,
            end
        );
        out.push_str(&render_rows(&WEEK_HEADERS[..5], &report.overall, config, false));
    }

    out
}

fn render_rows(
    headers: &[&str],
    records: &[PullRequestMetrics],
    config: &Config,
    with_created: bool,
) -> String {
    let mut rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            let mut row = vec![
                display_user(config, &r.user),
                r.merged.to_string(),
                r.merged_commits.to_string(),
                r.lgtmed.to_string(),
                r.non_lgtmed.to_string(),
            ];
            if with_created {
                row.push(r.created.unwrap_or_default().to_string());
            }
            row
        })
        .collect();

    let sum = totals(records);
    let mut total = vec![
        "Total".to_string(),
        sum.merged.to_string(),
        sum.merged_commits.to_string(),
        sum.lgtmed.to_string(),
        sum.non_lgtmed.to_string(),
    ];
    if with_created {
        total.push(sum.created.unwrap_or_default().to_string());
    }
    rows.push(total);

    format_table(headers, &rows)
}

/// Plain table with a title row, one column separator and no outer border.
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(Row::new(headers.iter().map(|h| Cell::new(h)).collect()));

    for row in rows {
        table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
    }

    table.to_string()
}
