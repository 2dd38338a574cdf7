//! Run settings
//!
//! Built once at process start from the command line and passed by reference
//! to everything that needs it.

use crate::tracker::github::RepoRef;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Options that change how the decision engine behaves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Labels that do not block automatic triage
    pub allow_labels: BTreeSet<String>,
    /// Surface verdicts as labels and comments without real triage actions
    pub diagnostic: bool,
}

impl EngineOptions {
    #[must_use]
    pub fn new(allow_labels: &str, diagnostic: bool) -> Self {
        Self {
            allow_labels: parse_allow_labels(allow_labels),
            diagnostic,
        }
    }

    #[must_use]
    pub fn allows_label(&self, label: &str) -> bool {
        self.allow_labels.contains(label)
    }
}

/// Split a pipe-delimited label list, trimming whitespace and dropping
/// empty entries.
#[must_use]
pub fn parse_allow_labels(raw: &str) -> BTreeSet<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Everything a run needs, resolved up front.
#[derive(Clone)]
pub struct RunSettings {
    pub token: String,
    pub repo: RepoRef,
    pub api_url: String,
    pub policy_path: PathBuf,
    pub batch_path: PathBuf,
    pub roster_url: Option<String>,
    pub roster_table: String,
    pub telemetry_url: Option<String>,
    pub seed: Option<u64>,
    pub engine: EngineOptions,
}

impl std::fmt::Debug for RunSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunSettings")
            .field("token", &"<redacted>")
            .field("repo", &self.repo)
            .field("api_url", &self.api_url)
            .field("policy_path", &self.policy_path)
            .field("batch_path", &self.batch_path)
            .field("roster_url", &self.roster_url.as_ref().map(|_| "<redacted>"))
            .field("roster_table", &self.roster_table)
            .field("telemetry_url", &self.telemetry_url)
            .field("seed", &self.seed)
            .field("engine", &self.engine)
            .finish()
    }
}
