//! Error types for the triage agent.
//!
//! Only [`ConfigError`] and [`BatchError`] are fatal: they are raised before
//! the batch loop starts. Everything raised while processing a single issue
//! is caught by the driver and recorded as an issue outcome.

use std::path::PathBuf;
use thiserror::Error;

/// Errors loading or validating the policy document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read policy document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse policy document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid accuracy {value} for '{key}' - expected a value in [0, 1]")]
    InvalidAccuracy { key: String, value: f64 },

    #[error("Invalid repository '{0}' - expected owner/name")]
    InvalidRepository(String),

    #[error("Invalid roster table name '{0}'")]
    InvalidRosterTable(String),
}

/// Errors loading or validating the classification batch.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to read batch file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse batch file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Issue #{issue}: {kind} confidence {value} is outside [0, 1]")]
    InvalidConfidence {
        issue: u64,
        kind: &'static str,
        value: f64,
    },

    #[error("Issue #{issue}: {kind} verdict has an empty category")]
    EmptyCategory { issue: u64, kind: &'static str },
}

/// Errors returned by the issue tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Other(String),
}

impl TrackerError {
    /// Status code of an API error, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by the roster store.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Roster store not configured")]
    NotConfigured,

    #[error("Roster store connection failed: {0}")]
    Connection(String),

    #[error("Roster query failed: {0}")]
    Query(String),

    #[error("Roster lookup task failed: {0}")]
    Task(String),
}

/// Errors delivering a telemetry event.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telemetry endpoint rejected event: {0}")]
    Rejected(u16),
}
