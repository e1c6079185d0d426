//! Error types for release-monitor
//!
//! Every error that escapes the core is fatal for the run: configuration
//! problems, uncompilable patterns and remote API failures all abort report
//! generation. Conditions the report simply absorbs (an unverified download
//! URL, a release without a matching milestone) are never represented here.

use thiserror::Error;

/// Result type alias for release-monitor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for release-monitor
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "milestone-pattern")
        key: Option<String>,
    },

    /// A configured regular expression does not compile
    #[error("cannot compile {key} regex '{pattern}': {source}")]
    InvalidPattern {
        /// The configuration key the pattern was read from
        key: String,
        /// The offending pattern text
        pattern: String,
        /// Underlying regex compilation error
        #[source]
        source: regex::Error,
    },

    /// The remote API answered with a non rate-limit failure
    #[error("GitHub API error on {endpoint}: HTTP {status}: {message}")]
    Api {
        /// Request path that failed (e.g., "/repos/acme/widget/tags")
        endpoint: String,
        /// HTTP status code returned by the remote
        status: u16,
        /// Response body or a description of the malformed response
        message: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A URL could not be constructed from the configured API base
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A repository worker panicked or was cancelled
    #[error("repository task failed: {0}")]
    Task(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// The configuration key associated with this error, if any
    pub fn config_key(&self) -> Option<&str> {
        match self {
            Error::Config { key, .. } => key.as_deref(),
            Error::InvalidPattern { key, .. } => Some(key),
            _ => None,
        }
    }
}
