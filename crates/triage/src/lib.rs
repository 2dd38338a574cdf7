//! Issue triage agent.
//!
//! Consumes a batch of classifier verdicts (one area verdict and one assignee
//! verdict per issue) and turns them into triage actions on a GitHub
//! repository: direct assignment from policy and suggestions, a random
//! roster fallback, and diagnostic labels and comments when running in
//! diagnostic mode.
//!
//! # Usage
//!
//! ```no_run
//! use triage::{driver, settings::{EngineOptions, RunSettings}};
//! use std::path::PathBuf;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = RunSettings {
//!     token: std::env::var("GITHUB_TOKEN")?,
//!     repo: "octo-org/octo-repo".parse()?,
//!     api_url: triage::tracker::github::DEFAULT_API_URL.to_string(),
//!     policy_path: PathBuf::from("classifier.yml"),
//!     batch_path: PathBuf::from("issue_labels.json"),
//!     roster_url: None,
//!     roster_table: triage::roster::DEFAULT_ROSTER_TABLE.to_string(),
//!     telemetry_url: None,
//!     seed: None,
//!     engine: EngineOptions::new("feature-request|info-needed", false),
//! };
//! let summary = driver::run(&settings).await?;
//! println!("assigned {} of {}", summary.assigned(), summary.processed());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`engine::TriageEngine`] decides per issue: skip filter, verdict
//!   planning, direct assignment, roster fallback
//! - [`executor::ActionExecutor`] performs side effects through an
//!   [`tracker::IssueTracker`]
//! - [`roster::RosterHandle`] resolves the fallback roster once per run
//! - [`telemetry::Telemetry`] dispatches classification events to sinks

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod batch;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod executor;
pub mod roster;
pub mod settings;
pub mod telemetry;
pub mod tracker;

pub use batch::{ClassificationBatch, IssueClassification, Verdict, VerdictKind};
pub use config::Policy;
pub use driver::{run, run_batch, RunSummary};
pub use engine::{IssueOutcome, TriageEngine};
pub use error::{BatchError, ConfigError, RosterError, TelemetryError, TrackerError};
pub use executor::ActionExecutor;
pub use roster::{RosterHandle, RosterProvider, RosterSnapshot};
pub use settings::{EngineOptions, RunSettings};
pub use telemetry::{Telemetry, TelemetryEvent, TelemetrySink};
pub use tracker::{GitHubIssueClient, IssueState, IssueTracker};
