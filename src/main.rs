use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

mod analysis;
mod commits;
mod config;
mod error;
mod github;
mod metrics;
mod output;
mod review;
mod window;

use analysis::ActivityAnalyzer;
use config::{Config, ConfigOverrides};
use github::RestClient;
use output::Reporter;
use window::StatWindow;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./pullstats.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stat begin time, overrides the configuration file
    #[arg(long)]
    since: Option<String>,

    /// Stat end time; disables week statistics
    #[arg(long)]
    until: Option<String>,

    /// Sort key (merged_prs, merged_commits)
    #[arg(short, long)]
    sort: Option<String>,

    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    format: String,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output_file: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.as_str())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    eprintln!(
        "{}",
        "pullstats - GitHub Pull Request Statistics"
            .bright_cyan()
            .bold()
    );

    let overrides = ConfigOverrides {
        stat_begin_time: cli.since,
        stat_end_time: cli.until,
        sort: cli.sort,
        token: cli.token,
    };
    let config = Config::load(cli.config.as_deref(), &overrides)?;
    let window = StatWindow::from_config(&config, Utc::now());

    info!(
        "Collecting statistics for {} users across {} repository entries",
        config.users.len(),
        config.repos.len()
    );

    let client = RestClient::new(&config)?;
    let analyzer = ActivityAnalyzer::new(&client, &config, window);
    let report = analyzer.analyze().await?;

    let reporter = Reporter::new(&cli.format, cli.output_file.as_deref());
    reporter.generate_report(&report, &config)?;

    eprintln!("\n{}", "Statistics complete!".bright_green().bold());

    Ok(())
}
