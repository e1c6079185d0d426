//! GitHub REST API response models
//!
//! Only the fields the report needs are deserialized; everything else in the
//! payload is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository in an account listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name without the owner prefix
    pub name: String,
}

/// A tag in a repository listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name
    pub name: String,
    /// Commit the tag points to
    pub commit: TagCommit,
}

/// Commit reference embedded in a tag
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCommit {
    /// Commit SHA
    pub sha: String,
}

/// A repository milestone
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Milestone title
    pub title: String,
    /// Browser URL of the milestone page
    pub html_url: String,
    /// "open" or "closed"
    pub state: String,
}

/// A commit looked up by SHA
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit SHA
    pub sha: String,
    /// Git-level commit data
    pub commit: CommitDetail,
}

impl Commit {
    /// Commit timestamp: committer date, falling back to author date
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let signature = |s: &Option<Signature>| s.as_ref().and_then(|s| s.date);
        signature(&self.commit.committer).or_else(|| signature(&self.commit.author))
    }
}

/// Author and committer information of a commit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    /// Author signature
    #[serde(default)]
    pub author: Option<Signature>,
    /// Committer signature
    #[serde(default)]
    pub committer: Option<Signature>,
}

/// Name and date attached to a commit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Person name
    #[serde(default)]
    pub name: Option<String>,
    /// Signature date
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}
