//! Core types for release-monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github::Milestone;

/// Which of an account's repositories are listed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Public repositories only
    #[default]
    Public,
    /// Public and private repositories
    All,
}

impl Visibility {
    /// Map the "show private" flag onto a visibility mode
    pub fn from_show_private(show_private: bool) -> Self {
        if show_private {
            Visibility::All
        } else {
            Visibility::Public
        }
    }

    /// Query parameter value understood by the GitHub API
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::All => "all",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A milestone correlated with a release
///
/// Only constructed through [`MilestoneMatch::new`], which always derives a
/// non-empty release-notes URL from the milestone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MilestoneMatch {
    /// The matched milestone
    pub milestone: Milestone,
    /// Milestone page listing closed issues (`<html_url>?closed=1`)
    pub url: String,
    /// Milestone state as reported by the remote ("open", "closed")
    pub state: String,
}

impl MilestoneMatch {
    /// Correlate a milestone, deriving the release-notes URL from it
    pub fn new(milestone: &Milestone) -> Self {
        Self {
            url: format!("{}?closed=1", milestone.html_url),
            state: milestone.state.clone(),
            milestone: milestone.clone(),
        }
    }

    /// The milestone title, used as the version in download templates
    pub fn title(&self) -> &str {
        &self.milestone.title
    }
}

/// A release candidate: a tag that survived name and cutoff filtering
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Release {
    /// Tag name
    pub name: String,
    /// Timestamp of the tag's commit
    pub created_at: DateTime<Utc>,
    /// Matched milestone, if the release name maps onto one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<MilestoneMatch>,
    /// Verified download URL (None = no template, or the probe failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl Release {
    /// Create an unmatched release candidate
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            created_at,
            milestone: None,
            download_url: None,
        }
    }

    /// Release-notes URL of the matched milestone
    pub fn milestone_url(&self) -> Option<&str> {
        self.milestone.as_ref().map(|m| m.url.as_str())
    }

    /// State of the matched milestone
    pub fn milestone_state(&self) -> Option<&str> {
        self.milestone.as_ref().map(|m| m.state.as_str())
    }

    /// Whether a milestone was correlated with this release
    pub fn is_matched(&self) -> bool {
        self.milestone.is_some()
    }
}

/// Per-repository result of a report run
///
/// Never empty: repositories without release candidates are dropped before a
/// report is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RepositoryReport {
    /// Repository name
    #[serde(rename = "repository")]
    pub name: String,
    /// All release candidates, matched or not, in tag order
    pub releases: Vec<Release>,
}

impl RepositoryReport {
    /// Releases that were correlated with a milestone
    pub fn matched_releases(&self) -> impl Iterator<Item = &Release> {
        self.releases.iter().filter(|r| r.is_matched())
    }
}

/// Progress events published while a report runs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportEvent {
    /// Repository selection finished
    RepositoriesSelected {
        /// Number of repositories that will be processed
        count: usize,
    },

    /// One repository's pipeline completed
    RepositoryProcessed {
        /// Repository name
        repository: String,
        /// Repositories completed so far (including this one)
        completed: usize,
        /// Total repositories in the run
        total: usize,
    },

    /// All repositories were processed
    Finished {
        /// Repositories that ended up in the report
        repositories: usize,
    },
}
