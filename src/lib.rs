//! # release-monitor
//!
//! Reports new releases across the repositories of a GitHub account.
//!
//! A report run selects the account's repositories by name, turns each
//! repository's tags into release candidates newer than a cutoff, correlates
//! every candidate with a milestone through a configurable pattern and, when
//! a download URL template is configured, keeps only download links that
//! actually answer `200 OK`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use release_monitor::{FileConfigStore, ReportRequest, generate_report};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileConfigStore::load_default()?;
//!     let reports = generate_report(
//!         &store,
//!         "work",
//!         &ReportRequest::default(),
//!         std::env::var("GITHUB_TOKEN").ok(),
//!     )
//!     .await?;
//!
//!     for report in &reports {
//!         println!("{}: {} releases", report.name, report.releases.len());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Release candidate building
pub mod candidates;
/// Configuration types and stores
pub mod config;
/// Download URL templating and verification
pub mod download;
/// Error types
pub mod error;
/// GitHub REST API client
pub mod github;
/// Milestone matching
pub mod milestones;
/// Rate-limit aware pagination
pub mod pagination;
/// Report generation and rendering
pub mod report;
/// Repository selection
pub mod selector;
/// Tracing setup
pub mod telemetry;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{
    Config, ConfigKey, ConfigStore, FileConfigStore, RemoteDefinition, ReportSettings,
    StaticConfigStore,
};
pub use error::{Error, Result};
pub use github::{GithubClient, RemoteApi};
pub use report::{ReportRequest, ReportRunner, RepositoryJob};
pub use types::{MilestoneMatch, Release, ReportEvent, RepositoryReport, Visibility};

/// Generate the report for a named remote
///
/// The token comes from the remote definition, falling back to `env_token`
/// (normally the value of `GITHUB_TOKEN`).
///
/// # Errors
///
/// Any configuration, pattern or remote API failure aborts the run.
pub async fn generate_report(
    store: &dyn ConfigStore,
    remote_name: &str,
    request: &ReportRequest,
    env_token: Option<String>,
) -> Result<Vec<RepositoryReport>> {
    let remote = store.remote(remote_name)?;
    let token = remote.credential(env_token)?;
    let runner = ReportRunner::from_settings(store.settings(), token)?;
    runner.generate(remote, request).await
}

/// Run a report until it finishes or the process receives a termination signal
///
/// An interrupted run yields [`Error::Task`]; in-flight repository workers
/// are cancelled.
///
/// # Errors
///
/// Returns the report's own error, or [`Error::Task`] on interruption.
pub async fn generate_until_signal(
    runner: &ReportRunner,
    remote: &RemoteDefinition,
    request: &ReportRequest,
) -> Result<Vec<RepositoryReport>> {
    tokio::select! {
        result = runner.generate(remote, request) => result,
        () = wait_for_signal() => Err(Error::Task("interrupted by signal".into())),
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        std::future::pending::<()>().await;
    }
}
