//! # Action Executor
//!
//! Issues every side effect the engine decides on: label creation and
//! attachment, assignees, diagnostic comments and telemetry. Repository
//! labels are created at most once per run no matter how many issues ask for
//! them.

use crate::engine::plan::{DiagnosticLabel, VerdictAction};
use crate::error::TrackerError;
use crate::telemetry::Telemetry;
use crate::tracker::{AssignmentLookup, IssueState, IssueTracker};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Applies triage actions through the tracker.
pub struct ActionExecutor {
    tracker: Arc<dyn IssueTracker>,
    telemetry: Arc<Telemetry>,
    known_labels: Mutex<HashSet<String>>,
}

impl ActionExecutor {
    #[must_use]
    pub fn new(tracker: Arc<dyn IssueTracker>, telemetry: Arc<Telemetry>) -> Self {
        Self {
            tracker,
            telemetry,
            known_labels: Mutex::new(HashSet::new()),
        }
    }

    /// Read the live state of an issue.
    ///
    /// # Errors
    /// Propagates tracker errors.
    pub async fn fetch_issue(&self, number: u64) -> Result<IssueState, TrackerError> {
        self.tracker.get_issue(number).await
    }

    /// Make sure a repository label exists, creating it with `color` if not.
    ///
    /// # Errors
    /// Propagates tracker errors from the existence check or creation.
    pub async fn ensure_label(&self, name: &str, color: &str) -> Result<(), TrackerError> {
        // Held across the remote calls so concurrent requests for the same
        // label cannot both create it.
        let mut known = self.known_labels.lock().await;
        if known.contains(name) {
            return Ok(());
        }

        if self.tracker.label_exists(name).await? {
            debug!(label = name, "Label already exists");
        } else {
            self.tracker.create_label(name, color).await?;
            info!(label = name, color, "Created label");
        }
        known.insert(name.to_string());
        Ok(())
    }

    /// Carry out the action derived from one verdict.
    ///
    /// A failed diagnostic label does not stop the comment from being posted;
    /// the first error is returned once both calls have run.
    ///
    /// # Errors
    /// Propagates tracker errors from diagnostic label and comment calls.
    pub async fn apply_verdict(
        &self,
        issue: u64,
        action: &VerdictAction,
    ) -> Result<(), TrackerError> {
        match action {
            VerdictAction::Annotate { label, comment } => {
                let labeled = match label {
                    Some(label) => self.attach_label(issue, label).await,
                    None => Ok(()),
                };
                if let Err(e) = &labeled {
                    warn!(
                        issue,
                        error = %e,
                        "Failed to attach diagnostic label, posting comment anyway"
                    );
                }

                let commented = self.tracker.post_comment(issue, comment).await;
                labeled.and(commented)
            }
            VerdictAction::Perform { event } => {
                self.telemetry.track(event.clone());
                Ok(())
            }
            VerdictAction::Skip => Ok(()),
        }
    }

    async fn attach_label(&self, issue: u64, label: &DiagnosticLabel) -> Result<(), TrackerError> {
        self.ensure_label(&label.name, label.color).await?;
        self.tracker.add_label(issue, &label.name).await
    }

    /// Ask whether `login` was ever assigned to the issue.
    pub async fn lookup_assignment(&self, issue: u64, login: &str) -> AssignmentLookup {
        self.tracker.find_assignment(issue, login).await.into()
    }

    /// # Errors
    /// Propagates tracker errors.
    pub async fn assign(&self, issue: u64, login: &str) -> Result<(), TrackerError> {
        self.tracker.add_assignee(issue, login).await?;
        info!(issue, assignee = login, "Assigned issue");
        Ok(())
    }

    /// # Errors
    /// Propagates tracker errors.
    pub async fn add_label(&self, issue: u64, label: &str) -> Result<(), TrackerError> {
        self.tracker.add_label(issue, label).await?;
        info!(issue, label, "Labeled issue");
        Ok(())
    }

    /// Wait for outstanding telemetry deliveries.
    pub async fn flush(&self) {
        self.telemetry.flush().await;
    }
}
