//! `grm` - GitHub release monitor
//!
//! ## Commands
//!
//! - `report`: list new releases of a configured remote's repositories

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info};

use release_monitor::report::render::{render_json, render_text};
use release_monitor::telemetry::{init_tracing, level_for};
use release_monitor::{
    ConfigStore, FileConfigStore, ReportEvent, ReportRequest, ReportRunner, generate_until_signal,
};

#[derive(Parser)]
#[command(name = "grm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Report new releases of a GitHub account's repositories", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Directory holding github-release-monitor/config.json (default: home directory)
    #[arg(long, env = "GRM_HOME", global = true)]
    home: Option<PathBuf>,

    /// Access token used when the remote definition has none
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report new releases of a remote's repositories
    Report {
        /// Remote definition name
        name: String,

        /// Include private repositories
        #[arg(short = 'p', long = "private")]
        private: bool,

        /// Only repositories whose name matches this regex
        #[arg(long)]
        repository_pattern: Option<String>,

        /// Only releases committed after this date (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_since)]
        since: Option<DateTime<Utc>>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Parse a `--since` value: a calendar date (midnight UTC) or an RFC 3339 timestamp
fn parse_since(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .ok_or_else(|| format!("invalid date '{value}'"));
    }
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected YYYY-MM-DD or an RFC 3339 timestamp, got '{value}': {e}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs, level_for(cli.verbose));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = match &cli.home {
        Some(home) => FileConfigStore::load(home),
        None => FileConfigStore::load_default(),
    }
    .context("Failed to load configuration")?;
    debug!(path = %store.path().display(), "configuration loaded");

    match cli.command {
        Commands::Report {
            name,
            private,
            repository_pattern,
            since,
            format,
        } => {
            let request = ReportRequest {
                show_private: private.then_some(true),
                repository_pattern,
                since,
            };
            cmd_report(&store, &name, &request, cli.token, format).await
        }
    }
}

async fn cmd_report(
    store: &dyn ConfigStore,
    name: &str,
    request: &ReportRequest,
    env_token: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let remote = store.remote(name)?;
    let token = remote.credential(env_token)?;
    let runner = ReportRunner::from_settings(store.settings(), token)
        .context("Failed to create GitHub client")?;

    let mut events = runner.subscribe();
    let progress = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ReportEvent::RepositoriesSelected { count }) => {
                    info!(repositories = count, "repositories selected");
                }
                Ok(ReportEvent::RepositoryProcessed {
                    repository,
                    completed,
                    total,
                }) => {
                    info!(%repository, "processed {completed}/{total}");
                }
                Ok(ReportEvent::Finished { repositories }) => {
                    debug!(repositories, "report finished");
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = generate_until_signal(&runner, remote, request).await;
    drop(runner);
    progress.await.ok();
    let reports = result.with_context(|| format!("Report for remote '{name}' failed"))?;

    let mut out = std::io::stdout().lock();
    match format {
        OutputFormat::Text => render_text(&reports, &mut out)?,
        OutputFormat::Json => render_json(&reports, &mut out)?,
    }
    out.flush()?;

    Ok(())
}
