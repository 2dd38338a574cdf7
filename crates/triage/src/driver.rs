//! Batch driver
//!
//! Wires the run together: loads policy and classifications, builds the
//! tracker client, telemetry and roster, then feeds every issue through the
//! engine in batch order. Per-issue failures end up in the [`RunSummary`];
//! only setup problems make [`run`] return an error.

use crate::batch::ClassificationBatch;
use crate::config::Policy;
use crate::engine::{IssueOutcome, TriageEngine};
use crate::executor::ActionExecutor;
use crate::roster::{RosterHandle, RosterProvider};
use crate::settings::RunSettings;
use crate::telemetry::sinks::{LogSink, WebhookSink};
use crate::telemetry::{Telemetry, TelemetrySink};
use crate::tracker::{GitHubIssueClient, IssueTracker};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome for one batch entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueReport {
    pub issue: u64,
    #[serde(flatten)]
    pub outcome: IssueOutcome,
}

/// Per-issue outcomes for a run, in batch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub issues: Vec<IssueReport>,
}

impl RunSummary {
    pub fn record(&mut self, issue: u64, outcome: IssueOutcome) {
        self.issues.push(IssueReport { issue, outcome });
    }

    #[must_use]
    pub fn processed(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, IssueOutcome::Skipped { .. }))
    }

    #[must_use]
    pub fn assigned(&self) -> usize {
        self.count(|outcome| outcome.assignee().is_some())
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, IssueOutcome::Failed { .. }))
    }

    #[must_use]
    pub fn outcome(&self, issue: u64) -> Option<&IssueOutcome> {
        self.issues
            .iter()
            .find(|report| report.issue == issue)
            .map(|report| &report.outcome)
    }

    fn count(&self, pred: impl Fn(&IssueOutcome) -> bool) -> usize {
        self.issues.iter().filter(|report| pred(&report.outcome)).count()
    }
}

/// Process every entry in batch order, one at a time.
pub async fn run_batch(engine: &mut TriageEngine<'_>, batch: &ClassificationBatch) -> RunSummary {
    let mut summary = RunSummary::default();
    for classification in batch {
        let issue = classification.issue_number;
        let outcome = engine.process(classification).await;
        info!(issue, outcome = ?outcome, "Processed issue");
        summary.record(issue, outcome);
    }
    summary
}

fn build_telemetry(settings: &RunSettings) -> Result<Telemetry> {
    let mut sinks: Vec<Arc<dyn TelemetrySink>> = vec![Arc::new(LogSink)];
    if let Some(url) = &settings.telemetry_url {
        let webhook = WebhookSink::new(url.as_str()).context("Failed to build telemetry webhook")?;
        sinks.push(Arc::new(webhook));
    }
    Ok(Telemetry::new(sinks))
}

#[cfg(feature = "postgres")]
fn build_roster(settings: &RunSettings) -> Result<Option<Arc<dyn RosterProvider>>> {
    let Some(url) = &settings.roster_url else {
        return Ok(None);
    };
    let roster = crate::roster::PostgresRoster::new(url.as_str(), &settings.roster_table)
        .context("Invalid roster configuration")?;
    Ok(Some(Arc::new(roster)))
}

#[cfg(not(feature = "postgres"))]
#[allow(clippy::unnecessary_wraps)]
fn build_roster(settings: &RunSettings) -> Result<Option<Arc<dyn RosterProvider>>> {
    if settings.roster_url.is_some() {
        warn!("Roster URL given but postgres support is not compiled in, fallback disabled");
    }
    Ok(None)
}

/// Run a full triage pass.
///
/// # Errors
/// Returns an error if the policy or batch cannot be loaded, or if the
/// tracker client, telemetry or roster cannot be configured.
pub async fn run(settings: &RunSettings) -> Result<RunSummary> {
    let policy = Policy::load(&settings.policy_path).with_context(|| {
        format!("Failed to load policy from {}", settings.policy_path.display())
    })?;
    let batch = ClassificationBatch::load(&settings.batch_path).with_context(|| {
        format!("Failed to load classifications from {}", settings.batch_path.display())
    })?;
    info!(
        repo = %settings.repo,
        issues = batch.len(),
        diagnostic = settings.engine.diagnostic,
        "Starting triage run"
    );

    let tracker: Arc<dyn IssueTracker> = Arc::new(
        GitHubIssueClient::new(settings.token.clone(), settings.repo.clone(), &settings.api_url)
            .context("Failed to create GitHub client")?,
    );
    let telemetry = Arc::new(build_telemetry(settings)?);
    let roster = RosterHandle::spawn(build_roster(settings)?);

    let rng = settings.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let executor = ActionExecutor::new(tracker, telemetry);
    let mut engine = TriageEngine::new(&policy, &settings.engine, &executor, roster, rng);

    let summary = run_batch(&mut engine, &batch).await;
    executor.flush().await;

    if summary.failed() > 0 {
        warn!(failed = summary.failed(), "Some issues could not be triaged");
    }
    info!(
        processed = summary.processed(),
        assigned = summary.assigned(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        "Triage run complete"
    );
    Ok(summary)
}
