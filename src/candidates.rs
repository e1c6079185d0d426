//! Release candidate building
//!
//! A release candidate is a tag whose name passes the release pattern and
//! whose commit was created strictly after the cutoff.

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::{Error, Result};
use crate::github::RemoteApi;
use crate::pagination::{fetch_all, fetch_one};
use crate::types::Release;

/// Whether a commit timestamp falls inside the reporting window
///
/// The cutoff instant itself is excluded.
pub fn is_after_cutoff(created_at: DateTime<Utc>, cutoff: DateTime<Utc>) -> bool {
    created_at > cutoff
}

/// Build the release candidates of one repository, in tag order
///
/// Each kept tag costs one extra remote call to resolve its commit date.
pub async fn build_candidates(
    api: &dyn RemoteApi,
    account: &str,
    repository: &str,
    pattern: Option<&Regex>,
    cutoff: DateTime<Utc>,
) -> Result<Vec<Release>> {
    let tags = fetch_all(|page| api.list_tags(account, repository, page)).await?;
    let listed = tags.len();

    let mut releases = Vec::new();
    for tag in tags
        .into_iter()
        .filter(|t| pattern.is_none_or(|p| p.is_match(&t.name)))
    {
        let sha = tag.commit.sha.as_str();
        let commit = fetch_one(|| api.get_commit(account, repository, sha)).await?;
        let created_at = commit.timestamp().ok_or_else(|| Error::Api {
            endpoint: format!("/repos/{account}/{repository}/commits/{sha}"),
            status: 200,
            message: "commit carries neither a committer nor an author date".into(),
        })?;

        if is_after_cutoff(created_at, cutoff) {
            releases.push(Release::new(tag.name, created_at));
        }
    }

    tracing::debug!(
        repository,
        tags = listed,
        candidates = releases.len(),
        "release candidates built"
    );

    Ok(releases)
}
