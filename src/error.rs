//! Error types for live classification.
//!
//! Only infrastructure failures are errors in this crate. Bad upstream data
//! (unparseable timestamps, clock anomalies, missing fields) never reaches this
//! module: the timing pipeline degrades it to "absent" or "incomplete" instead.
//!
//! ## Error Categories
//!
//! - **Subscription Errors**: an upstream change feed failed to deliver
//! - **Publication Errors**: writing the public snapshot failed
//! - **Configuration Errors**: a config file could not be read or is invalid
//! - **Lifecycle Errors**: an operation that needs an active event was called while idle
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use podium::StandingsError;
//!
//! let error = StandingsError::subscription_failed("competitors of event 42", "permission denied");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for classification operations.
pub type Result<T, E = StandingsError> = std::result::Result<T, E>;

/// Main error type for classification operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StandingsError {
    #[error("Subscription to {scope} failed: {reason}")]
    Subscription {
        scope: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to publish classification for event {event_id}: {reason}")]
    Publication {
        event_id: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration error in {context}: {details}")]
    Config { context: String, details: String },

    #[error("Config file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid event id '{value}'")]
    InvalidEventId { value: String },

    #[error("No event is active")]
    NotActive,
}

impl StandingsError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            StandingsError::Subscription { .. } => true,
            StandingsError::Publication { .. } => true,
            StandingsError::Config { .. } => false,
            StandingsError::File { .. } => false,
            StandingsError::InvalidEventId { .. } => false,
            StandingsError::NotActive => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            StandingsError::Subscription { .. } => vec![
                "Check connectivity to the competitor directory",
                "Verify read access to the event and its competitors",
                "Wait for the change feed to recover",
            ],
            StandingsError::Publication { .. } => vec![
                "Check write access to the public classification document",
                "The next recomputation will attempt another write",
            ],
            StandingsError::Config { .. } => vec![
                "Check the configuration values",
                "Remove the offending key to fall back to the default",
            ],
            StandingsError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            StandingsError::InvalidEventId { .. } => vec![
                "Pass a non-empty event identifier",
                "Strip path separators from the identifier",
            ],
            StandingsError::NotActive => vec!["Activate an event before reading its classification"],
        }
    }

    /// Helper constructor for subscription errors.
    pub fn subscription_failed(scope: impl Into<String>, reason: impl Into<String>) -> Self {
        StandingsError::Subscription { scope: scope.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for subscription errors with source.
    pub fn subscription_failed_with_source(
        scope: impl Into<String>,
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        StandingsError::Subscription {
            scope: scope.into(),
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Helper constructor for publication errors.
    pub fn publication_failed(event_id: impl Into<String>, reason: impl Into<String>) -> Self {
        StandingsError::Publication { event_id: event_id.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        StandingsError::Config { context: context.into(), details: details.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        StandingsError::File { path, source }
    }
}

impl From<std::io::Error> for StandingsError {
    fn from(err: std::io::Error) -> Self {
        StandingsError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_yaml_ng::Error> for StandingsError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        StandingsError::Config { context: "YAML".to_string(), details: err.to_string() }
    }
}
