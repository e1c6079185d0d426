//! Report generation
//!
//! [`ReportRunner`] selects the account's repositories and runs one
//! [`RepositoryJob`] per repository over a bounded pool of workers. Each job
//! is an immutable input built before any worker starts and runs its stages
//! strictly in sequence:
//!
//! 1. fetch the repository's milestones
//! 2. build release candidates from its tags
//! 3. match every candidate to a milestone
//! 4. verify the download URL of every matched candidate
//!
//! Jobs share only the remote API client, the download verifier and the
//! progress counter. The first failing job aborts the run; no partial report
//! is returned.

pub mod render;

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::candidates::build_candidates;
use crate::config::{ConfigKey, RemoteDefinition, ReportSettings};
use crate::download::DownloadVerifier;
use crate::error::{Error, Result};
use crate::github::{GithubClient, RemoteApi};
use crate::milestones::MilestoneMatcher;
use crate::pagination::fetch_all;
use crate::selector::{RepositoryFilter, compile_pattern, select_repositories};
use crate::types::{ReportEvent, RepositoryReport, Visibility};

/// Capacity of the progress event channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Per-run options that take precedence over the remote definition
#[derive(Clone, Debug, Default)]
pub struct ReportRequest {
    /// Include private repositories (None = use the remote's setting)
    pub show_private: Option<bool>,
    /// Repository name regex (None = use the remote's pattern)
    pub repository_pattern: Option<String>,
    /// Only tags committed after this instant are reported (None = since the epoch)
    pub since: Option<DateTime<Utc>>,
}

impl ReportRequest {
    /// Effective cutoff instant
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.since.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Everything one repository's pipeline needs, resolved up front
#[derive(Clone, Debug)]
pub struct RepositoryJob {
    /// Account owning the repository
    pub account: String,
    /// Repository name
    pub repository: String,
    /// Tag name filter (None = every tag)
    pub release_pattern: Option<Regex>,
    /// Milestone title extraction
    pub milestones: MilestoneMatcher,
    /// Download URL template (None or empty = no download link)
    pub download_template: Option<String>,
    /// Tags committed at or before this instant are dropped
    pub cutoff: DateTime<Utc>,
}

impl RepositoryJob {
    /// Resolve a repository's patterns and template through its overrides
    ///
    /// # Errors
    /// Fails when the milestone pattern is missing or empty, or when either
    /// pattern does not compile.
    pub fn resolve(
        account: &str,
        repository: &str,
        remote: &RemoteDefinition,
        cutoff: DateTime<Utc>,
    ) -> Result<Self> {
        let release_pattern = remote
            .resolve(ConfigKey::ReleasePattern, repository)
            .map(|p| compile_pattern(ConfigKey::ReleasePattern, p))
            .transpose()?;
        let milestones =
            MilestoneMatcher::new(remote.resolve(ConfigKey::MilestonePattern, repository))
                .map_err(|e| match e {
                    Error::Config { message, key } => Error::Config {
                        message: format!("{message} (repository {repository})"),
                        key,
                    },
                    other => other,
                })?;

        Ok(Self {
            account: account.to_string(),
            repository: repository.to_string(),
            release_pattern,
            milestones,
            download_template: remote
                .resolve(ConfigKey::DownloadUrl, repository)
                .map(str::to_string),
            cutoff,
        })
    }
}

/// Run one repository's pipeline
///
/// Returns `None` when the repository has no release candidates.
pub async fn process_repository(
    api: &dyn RemoteApi,
    verifier: &DownloadVerifier,
    job: &RepositoryJob,
) -> Result<Option<RepositoryReport>> {
    let account = job.account.as_str();
    let repository = job.repository.as_str();

    let milestones = fetch_all(|page| api.list_milestones(account, repository, page)).await?;
    let mut releases = build_candidates(
        api,
        account,
        repository,
        job.release_pattern.as_ref(),
        job.cutoff,
    )
    .await?;

    if releases.is_empty() {
        debug!(repository, "no release candidates");
        return Ok(None);
    }

    let template = job.download_template.as_deref().unwrap_or_default();
    for release in &mut releases {
        job.milestones.apply(release, &milestones);
        let Some(version) = release.milestone.as_ref().map(|m| m.title().to_string()) else {
            continue;
        };
        release.download_url = verifier
            .resolve(template, account, repository, &version)
            .await;
    }

    Ok(Some(RepositoryReport {
        name: job.repository.clone(),
        releases,
    }))
}

/// Runs repository jobs with bounded parallelism
pub struct ReportRunner {
    api: Arc<dyn RemoteApi>,
    verifier: DownloadVerifier,
    max_concurrent: usize,
    event_tx: broadcast::Sender<ReportEvent>,
}

impl ReportRunner {
    /// Create a runner around an injected API client
    pub fn new(api: Arc<dyn RemoteApi>, verifier: DownloadVerifier, max_concurrent: usize) -> Self {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            verifier,
            max_concurrent,
            event_tx,
        }
    }

    /// Create a runner talking to GitHub with the given settings and token
    ///
    /// # Errors
    /// Returns error if either HTTP client cannot be created
    pub fn from_settings(settings: &ReportSettings, token: impl Into<String>) -> Result<Self> {
        let api = GithubClient::new(settings, token)?;
        let verifier = DownloadVerifier::new(settings.request_timeout, &settings.user_agent)?;
        Ok(Self::new(
            Arc::new(api),
            verifier,
            settings.max_concurrent_repositories,
        ))
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<ReportEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: ReportEvent) {
        // send() only fails without receivers, which is fine
        self.event_tx.send(event).ok();
    }

    /// Workers used for `jobs` jobs: the configured limit, shrunk to the job count
    pub fn worker_count(&self, jobs: usize) -> usize {
        self.max_concurrent.max(1).min(jobs)
    }

    /// Select repositories for a remote and build the report
    pub async fn generate(
        &self,
        remote: &RemoteDefinition,
        request: &ReportRequest,
    ) -> Result<Vec<RepositoryReport>> {
        let account = remote.account()?;
        let visibility =
            Visibility::from_show_private(request.show_private.unwrap_or(remote.show_private));
        let pattern = request
            .repository_pattern
            .as_deref()
            .or(remote.repository_pattern.as_deref());
        let filter = RepositoryFilter::new(pattern, remote.blacklist()?)?;
        let cutoff = request.cutoff();

        let repositories =
            select_repositories(self.api.as_ref(), account, visibility, &filter).await?;
        self.emit(ReportEvent::RepositoriesSelected {
            count: repositories.len(),
        });

        let jobs = repositories
            .iter()
            .map(|r| RepositoryJob::resolve(account, &r.name, remote, cutoff))
            .collect::<Result<Vec<_>>>()?;

        self.run(jobs).await
    }

    /// Run all jobs and collect the non-empty repository reports
    ///
    /// Each report lands in the slot of the job that produced it, so result
    /// order follows job order; callers that need a different order sort
    /// afterwards.
    pub async fn run(&self, jobs: Vec<RepositoryJob>) -> Result<Vec<RepositoryReport>> {
        let total = jobs.len();
        let workers = self.worker_count(total);
        info!(repositories = total, workers, "processing repositories");

        let limiter = Arc::new(Semaphore::new(workers));
        let completed = Arc::new(AtomicUsize::new(0));
        let mut slots: Vec<Option<RepositoryReport>> = (0..total).map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for (slot, job) in jobs.into_iter().enumerate() {
            let api = Arc::clone(&self.api);
            let verifier = self.verifier.clone();
            let limiter = Arc::clone(&limiter);
            let completed = Arc::clone(&completed);
            let event_tx = self.event_tx.clone();

            tasks.spawn(async move {
                let _permit = limiter
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::Task(e.to_string()))?;

                let result = process_repository(api.as_ref(), &verifier, &job).await;

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                event_tx
                    .send(ReportEvent::RepositoryProcessed {
                        repository: job.repository.clone(),
                        completed: done,
                        total,
                    })
                    .ok();

                result.map(|report| (slot, report))
            });
        }

        // Dropping the JoinSet on an early return aborts the remaining workers
        while let Some(joined) = tasks.join_next().await {
            let (slot, report) = joined.map_err(|e| Error::Task(e.to_string()))??;
            if let Some(entry) = slots.get_mut(slot) {
                *entry = report;
            }
        }

        let reports: Vec<RepositoryReport> = slots.into_iter().flatten().collect();
        info!(repositories = reports.len(), "report complete");
        self.emit(ReportEvent::Finished {
            repositories: reports.len(),
        });

        Ok(reports)
    }
}
