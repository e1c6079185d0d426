//! Remote API seam
//!
//! [`RemoteApi`] is the capability the report pipeline consumes. It is shared
//! by every repository worker, so implementations must be safe for concurrent
//! use. [`GithubClient`] talks to the GitHub REST API; tests substitute
//! in-process fakes.

mod client;
mod models;

pub use client::{GithubClient, next_page_link};
pub use models::{Commit, CommitDetail, Milestone, Repository, Signature, Tag, TagCommit};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::Visibility;

/// Items requested per page from every listing endpoint
pub const PAGE_SIZE: u32 = 100;

/// First page number of every listing
pub const FIRST_PAGE: u32 = 1;

/// Rate-limit signal carried by each remote response
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimit {
    /// Calls left in the current window
    pub remaining: u32,
    /// Instant at which the window resets
    pub reset: DateTime<Utc>,
}

impl RateLimit {
    /// Whether the caller must wait for `reset` before retrying
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Outcome of a single remote call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fetched<T> {
    /// The response was interpreted
    Ready(T),
    /// No calls remain until `reset`; the identical request must be re-issued then
    RateLimited {
        /// When the rate-limit window resets
        reset: DateTime<Utc>,
    },
}

/// One page of a listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    /// Items in remote order
    pub items: Vec<T>,
    /// Whether the remote announced a further page
    pub has_next_page: bool,
}

impl<T> Page<T> {
    /// A page with no successor
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            has_next_page: false,
        }
    }

    /// A page followed by at least one more
    pub fn more(items: Vec<T>) -> Self {
        Self {
            items,
            has_next_page: true,
        }
    }
}

/// Read-only operations against the remote account
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// List repositories owned by `account`
    async fn list_repositories(
        &self,
        account: &str,
        visibility: Visibility,
        page: u32,
    ) -> Result<Fetched<Page<Repository>>>;

    /// List tags of a repository
    async fn list_tags(
        &self,
        account: &str,
        repository: &str,
        page: u32,
    ) -> Result<Fetched<Page<Tag>>>;

    /// List milestones of a repository, open and closed
    async fn list_milestones(
        &self,
        account: &str,
        repository: &str,
        page: u32,
    ) -> Result<Fetched<Page<Milestone>>>;

    /// Look up a single commit by SHA
    async fn get_commit(
        &self,
        account: &str,
        repository: &str,
        sha: &str,
    ) -> Result<Fetched<Commit>>;
}
