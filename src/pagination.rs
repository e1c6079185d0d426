//! Paginated fetching with rate-limit waits
//!
//! Every listing endpoint is drained through [`fetch_all`]: pages are requested
//! in order starting at page 1, and whenever the remote reports an exhausted
//! rate limit the *same* request is re-issued after sleeping until the reset
//! instant. Waiting is flow control, not an error, so it is retried
//! indefinitely. Any other failure is returned to the caller unchanged.
//!
//! # Example
//!
//! ```no_run
//! use release_monitor::github::{GithubClient, RemoteApi};
//! use release_monitor::pagination::fetch_all;
//!
//! # async fn example(client: GithubClient) -> release_monitor::Result<()> {
//! let tags = fetch_all(|page| client.list_tags("acme", "widget", page)).await?;
//! println!("{} tags", tags.len());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;

use crate::error::Result;
use crate::github::{FIRST_PAGE, Fetched, Page};

/// Collect every item of a paged listing, in remote order
///
/// `fetch_page` is called with page numbers 1, 2, ... until a page reports no
/// successor.
pub async fn fetch_all<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Fetched<Page<T>>>>,
{
    let mut items = Vec::new();
    let mut page = FIRST_PAGE;

    loop {
        match fetch_page(page).await? {
            Fetched::RateLimited { reset } => {
                wait_for_reset(reset).await;
            }
            Fetched::Ready(fetched) => {
                tracing::debug!(page, items = fetched.items.len(), "page fetched");
                items.extend(fetched.items);

                if !fetched.has_next_page {
                    return Ok(items);
                }
                page += 1;
            }
        }
    }
}

/// Perform a single (non-paged) request, waiting out rate limits
pub async fn fetch_one<T, F, Fut>(mut fetch: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Fetched<T>>>,
{
    loop {
        match fetch().await? {
            Fetched::Ready(value) => return Ok(value),
            Fetched::RateLimited { reset } => wait_for_reset(reset).await,
        }
    }
}

/// Time left until `reset`, zero if it already passed
pub fn until_reset(reset: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (reset - now).to_std().unwrap_or(Duration::ZERO)
}

/// Suspend the current task until the rate-limit window resets
///
/// Has no upper bound: a far-away reset means a long sleep.
pub async fn wait_for_reset(reset: DateTime<Utc>) {
    let wait = until_reset(reset, Utc::now());
    tracing::warn!(
        reset = %reset,
        wait_secs = wait.as_secs(),
        "GitHub rate limit exhausted, waiting for reset"
    );
    tokio::time::sleep(wait).await;
}
