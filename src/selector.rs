//! Repository selection
//!
//! Lists every repository the account owns and keeps those whose name matches
//! the repository pattern (when one is set) and that are not blacklisted.

use regex::Regex;
use std::collections::HashSet;

use crate::config::ConfigKey;
use crate::error::{Error, Result};
use crate::github::{RemoteApi, Repository};
use crate::pagination::fetch_all;
use crate::types::Visibility;

/// Name-based repository filter
#[derive(Clone, Debug, Default)]
pub struct RepositoryFilter {
    pattern: Option<Regex>,
    blacklist: HashSet<String>,
}

impl RepositoryFilter {
    /// Build a filter from an optional pattern and an exclusion list
    ///
    /// An empty pattern is treated as unset.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPattern`] if the pattern does not compile
    pub fn new(pattern: Option<&str>, blacklist: HashSet<String>) -> Result<Self> {
        let pattern = pattern
            .filter(|p| !p.is_empty())
            .map(|p| compile_pattern(ConfigKey::RepositoryPattern, p))
            .transpose()?;

        Ok(Self { pattern, blacklist })
    }

    /// Whether a repository name passes the filter
    pub fn accepts(&self, name: &str) -> bool {
        let matches = self.pattern.as_ref().is_none_or(|p| p.is_match(name));
        matches && !self.blacklist.contains(name)
    }
}

/// Compile a configured pattern, naming the key on failure
pub fn compile_pattern(key: ConfigKey, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        key: key.name().to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

/// List the account's owned repositories that pass `filter`
///
/// Order is preserved from the remote listing.
pub async fn select_repositories(
    api: &dyn RemoteApi,
    account: &str,
    visibility: Visibility,
    filter: &RepositoryFilter,
) -> Result<Vec<Repository>> {
    let repositories = fetch_all(|page| api.list_repositories(account, visibility, page)).await?;
    let total = repositories.len();

    let selected: Vec<Repository> = repositories
        .into_iter()
        .filter(|r| filter.accepts(&r.name))
        .collect();

    tracing::info!(
        account,
        %visibility,
        listed = total,
        selected = selected.len(),
        "repositories selected"
    );

    Ok(selected)
}
