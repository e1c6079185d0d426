//! Configuration types for release-monitor
//!
//! A configuration file holds global [`ReportSettings`] plus any number of
//! named [`RemoteDefinition`]s. Each remote definition carries account-level
//! defaults; overloadable keys can additionally be overridden per repository
//! with a `key:repository` entry in its `overrides` table.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Directory below the user's home that holds the configuration
pub const CONFIG_DIR_NAME: &str = "github-release-monitor";

/// File name of the configuration document
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Keys understood in a remote definition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Login name used for authentication
    Username,
    /// Access token
    Token,
    /// Account whose repositories are reported (defaults to the username)
    RemoteUser,
    /// Whether private repositories are included
    ShowPrivate,
    /// Regex selecting repository names
    RepositoryPattern,
    /// Regex selecting tag names
    ReleasePattern,
    /// Regex extracting the milestone title from a tag name
    MilestonePattern,
    /// Boolean marking a repository as excluded
    RepositoryBlacklisted,
    /// Download URL template
    DownloadUrl,
}

impl ConfigKey {
    /// All keys, in documentation order
    pub const ALL: [ConfigKey; 9] = [
        ConfigKey::Username,
        ConfigKey::Token,
        ConfigKey::RemoteUser,
        ConfigKey::ShowPrivate,
        ConfigKey::RepositoryPattern,
        ConfigKey::ReleasePattern,
        ConfigKey::MilestonePattern,
        ConfigKey::RepositoryBlacklisted,
        ConfigKey::DownloadUrl,
    ];

    /// Name of the key as written in configuration and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::Username => "username",
            ConfigKey::Token => "token",
            ConfigKey::RemoteUser => "user",
            ConfigKey::ShowPrivate => "show-private",
            ConfigKey::RepositoryPattern => "repository-pattern",
            ConfigKey::ReleasePattern => "release-pattern",
            ConfigKey::MilestonePattern => "milestone-pattern",
            ConfigKey::RepositoryBlacklisted => "repository-blacklisted",
            ConfigKey::DownloadUrl => "download-url",
        }
    }

    /// Whether the key accepts a per-repository `key:repository` override
    pub fn overloadable(&self) -> bool {
        matches!(
            self,
            ConfigKey::ReleasePattern
                | ConfigKey::MilestonePattern
                | ConfigKey::RepositoryBlacklisted
                | ConfigKey::DownloadUrl
        )
    }

    /// Override entry name for a repository (`download-url:widget`)
    pub fn override_key(&self, repository: &str) -> String {
        format!("{}:{}", self.name(), repository)
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ConfigKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ConfigKey::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| Error::config(s, format!("unknown configuration key '{s}'")))
    }
}

/// A named profile for one GitHub account
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RemoteDefinition {
    /// Login name
    #[serde(default)]
    pub username: Option<String>,

    /// Access token (falls back to `GITHUB_TOKEN`)
    #[serde(default)]
    pub token: Option<String>,

    /// Account to report on, when different from the login
    #[serde(default)]
    pub user: Option<String>,

    /// Include private repositories (default: false)
    #[serde(default)]
    pub show_private: bool,

    /// Repository name regex (None = all repositories)
    #[serde(default)]
    pub repository_pattern: Option<String>,

    /// Tag name regex (None = all tags)
    #[serde(default)]
    pub release_pattern: Option<String>,

    /// Regex whose first capture group yields the milestone title
    #[serde(default)]
    pub milestone_pattern: Option<String>,

    /// Download URL template with `{account}`/`{name}`, `{repository}` and `{version}`
    #[serde(default)]
    pub download_url: Option<String>,

    /// Repository names never reported
    #[serde(default)]
    pub repository_blacklist: Vec<String>,

    /// Per-repository overrides keyed `key:repository`
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

impl RemoteDefinition {
    /// Account-level default for a key
    pub fn default_value(&self, key: ConfigKey) -> Option<&str> {
        match key {
            ConfigKey::Username => self.username.as_deref(),
            ConfigKey::Token => self.token.as_deref(),
            ConfigKey::RemoteUser => self.user.as_deref(),
            ConfigKey::ShowPrivate => Some(if self.show_private { "true" } else { "false" }),
            ConfigKey::RepositoryPattern => self.repository_pattern.as_deref(),
            ConfigKey::ReleasePattern => self.release_pattern.as_deref(),
            ConfigKey::MilestonePattern => self.milestone_pattern.as_deref(),
            ConfigKey::RepositoryBlacklisted => None,
            ConfigKey::DownloadUrl => self.download_url.as_deref(),
        }
    }

    /// Resolve a key for a repository
    ///
    /// An exact `key:repository` override wins; otherwise the account-level
    /// default applies. `None` means "not set", which is distinct from an
    /// empty string.
    pub fn resolve(&self, key: ConfigKey, repository: &str) -> Option<&str> {
        if key.overloadable() && !repository.is_empty() {
            if let Some(value) = self.overrides.get(&key.override_key(repository)) {
                return Some(value.as_str());
            }
        }
        self.default_value(key)
    }

    /// Account whose repositories are reported
    pub fn account(&self) -> Result<&str> {
        self.user
            .as_deref()
            .or(self.username.as_deref())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                Error::config(
                    ConfigKey::Username.name(),
                    "could not retrieve username from config",
                )
            })
    }

    /// Access token, taken from the definition or the given environment value
    pub fn credential(&self, env_token: Option<String>) -> Result<String> {
        self.token
            .clone()
            .or(env_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::config(
                    ConfigKey::Token.name(),
                    "missing required credential: set a token or GITHUB_TOKEN",
                )
            })
    }

    /// Names of all excluded repositories
    ///
    /// Combines `repository_blacklist` with every
    /// `repository-blacklisted:<repo>` override that is `true`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when an override is not a boolean.
    pub fn blacklist(&self) -> Result<HashSet<String>> {
        let prefix = format!("{}:", ConfigKey::RepositoryBlacklisted.name());
        let mut names: HashSet<String> = self.repository_blacklist.iter().cloned().collect();

        for (key, value) in &self.overrides {
            let Some(repository) = key.strip_prefix(&prefix) else {
                continue;
            };
            let excluded = value.trim().parse::<bool>().map_err(|_| {
                Error::config(
                    key.clone(),
                    format!("could not parse boolean '{value}' for {key}"),
                )
            })?;
            if excluded {
                names.insert(repository.to_string());
            }
        }

        Ok(names)
    }
}

/// Settings shared by every remote
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Base URL of the GitHub REST API (default: "https://api.github.com")
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Repositories processed concurrently (default: 8)
    #[serde(default = "default_max_concurrent_repositories")]
    pub max_concurrent_repositories: usize,

    /// Timeout for each HTTP request, in seconds (default: 30)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            max_concurrent_repositories: default_max_concurrent_repositories(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// The whole configuration document
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: ReportSettings,

    /// Remote definitions by name
    #[serde(default)]
    pub remotes: HashMap<String, RemoteDefinition>,
}

/// Read-only source of remote definitions
///
/// Accessed concurrently during a report run but never mutated by it.
pub trait ConfigStore: Send + Sync {
    /// Look up a remote definition by name
    fn remote(&self, name: &str) -> Result<&RemoteDefinition>;

    /// Global settings
    fn settings(&self) -> &ReportSettings;
}

/// Configuration held in memory
#[derive(Clone, Debug, Default)]
pub struct StaticConfigStore {
    config: Config,
}

impl StaticConfigStore {
    /// Wrap an already-built configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigStore for StaticConfigStore {
    fn remote(&self, name: &str) -> Result<&RemoteDefinition> {
        lookup_remote(&self.config, name)
    }

    fn settings(&self) -> &ReportSettings {
        &self.config.settings
    }
}

/// Configuration loaded from `<home>/github-release-monitor/config.json`
#[derive(Clone, Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    config: Config,
}

impl FileConfigStore {
    /// Location of the configuration file below a home directory
    pub fn config_path(home: &Path) -> PathBuf {
        home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
    }

    /// Load the configuration below the given home directory
    ///
    /// A missing file yields an empty configuration.
    pub fn load(home: &Path) -> Result<Self> {
        let path = Self::config_path(home);

        let config = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no configuration file, using defaults");
                Config::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, config })
    }

    /// Load the configuration below the current user's home directory
    pub fn load_default() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| Error::Config {
            message: "cannot determine the current user's home directory".into(),
            key: None,
        })?;
        Self::load(&home)
    }

    /// Path the configuration was read from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn remote(&self, name: &str) -> Result<&RemoteDefinition> {
        lookup_remote(&self.config, name)
    }

    fn settings(&self) -> &ReportSettings {
        &self.config.settings
    }
}

fn lookup_remote<'a>(config: &'a Config, name: &str) -> Result<&'a RemoteDefinition> {
    config.remotes.get(name).ok_or_else(|| Error::Config {
        message: format!("no remote definition named '{name}'"),
        key: None,
    })
}

// Default value functions
fn default_api_url() -> String {
    "https://api.github.com".into()
}

fn default_max_concurrent_repositories() -> usize {
    8
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("release-monitor/{}", env!("CARGO_PKG_VERSION"))
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
