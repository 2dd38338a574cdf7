//! # Issue Tracker
//!
//! The tracker is a remote collaborator: the engine reads live issue state
//! through it and issues every side effect through it. Retry and auth policy
//! belong to the implementation, never to the engine.
//!
//! - **`IssueTracker`**: capability trait used by the engine and executor
//! - **`GitHubIssueClient`**: GitHub REST implementation

pub mod github;

pub use github::GitHubIssueClient;

use crate::error::TrackerError;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Live state of an issue, re-read for every decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueState {
    pub number: u64,
    pub current_assignee: Option<String>,
    pub current_labels: BTreeSet<String>,
}

impl IssueState {
    #[must_use]
    pub fn new(number: u64) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.current_assignee = Some(assignee.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.current_labels.insert(label.into());
        self
    }
}

/// Outcome of asking whether an identity was ever assigned to an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentLookup {
    /// An assignment event exists; `by` is the actor that made it, if known.
    Assigned { by: Option<String> },
    NotAssigned,
    LookupFailed(String),
}

impl From<Result<Option<String>, TrackerError>> for AssignmentLookup {
    fn from(result: Result<Option<String>, TrackerError>) -> Self {
        match result {
            Ok(Some(actor)) => Self::Assigned { by: Some(actor) },
            Ok(None) => Self::NotAssigned,
            Err(e) => Self::LookupFailed(e.to_string()),
        }
    }
}

/// Issue tracker operations needed for triage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch the live state of an issue.
    async fn get_issue(&self, number: u64) -> Result<IssueState, TrackerError>;

    /// Check whether a repository label exists.
    async fn label_exists(&self, name: &str) -> Result<bool, TrackerError>;

    /// Create a repository label.
    async fn create_label(&self, name: &str, color: &str) -> Result<(), TrackerError>;

    /// Attach a label to an issue.
    async fn add_label(&self, number: u64, label: &str) -> Result<(), TrackerError>;

    /// Add an assignee to an issue.
    async fn add_assignee(&self, number: u64, login: &str) -> Result<(), TrackerError>;

    /// Post a comment on an issue.
    async fn post_comment(&self, number: u64, body: &str) -> Result<(), TrackerError>;

    /// Find a prior assignment of `login` on the issue.
    ///
    /// Returns the actor that performed the assignment, `Ok(None)` if no
    /// assignment event exists. Callers convert the result into an
    /// [`AssignmentLookup`].
    async fn find_assignment(&self, number: u64, login: &str)
        -> Result<Option<String>, TrackerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_lookup_from_result() {
        assert_eq!(
            AssignmentLookup::from(Ok(Some("octocat".to_string()))),
            AssignmentLookup::Assigned {
                by: Some("octocat".to_string())
            }
        );
        assert_eq!(
            AssignmentLookup::from(Ok(None)),
            AssignmentLookup::NotAssigned
        );
        let failed = AssignmentLookup::from(Err(TrackerError::Api {
            status: 502,
            message: "Bad Gateway".to_string(),
        }));
        assert!(matches!(failed, AssignmentLookup::LookupFailed(msg) if msg.contains("502")));
    }

    #[test]
    fn test_issue_state_builders() {
        let state = IssueState::new(9).with_assignee("alice").with_label("bug");
        assert_eq!(state.number, 9);
        assert_eq!(state.current_assignee.as_deref(), Some("alice"));
        assert!(state.current_labels.contains("bug"));
    }
}
