//! Assignment resolution: direct candidates first, then the roster.

use crate::config::Policy;
use crate::engine::plan::TRIAGE_NEEDED_LABEL;
use crate::engine::IssueOutcome;
use crate::error::TrackerError;
use crate::executor::ActionExecutor;
use crate::roster::{RosterHandle, RosterSnapshot};
use crate::tracker::AssignmentLookup;
use rand::Rng;
use tracing::{debug, error, info, warn};

/// Assign the first candidate that was never assigned to this issue before.
///
/// Returns the assigned identity, or `None` when the list is empty or
/// exhausted. A failed lookup counts as "not assigned" so that a flaky
/// events endpoint cannot block triage.
///
/// # Errors
/// Propagates the tracker error if adding the assignee fails.
pub async fn resolve_direct(
    executor: &ActionExecutor,
    issue: u64,
    candidates: &[String],
) -> Result<Option<String>, TrackerError> {
    for candidate in candidates {
        match executor.lookup_assignment(issue, candidate).await {
            AssignmentLookup::Assigned { by } => {
                debug!(
                    issue,
                    candidate = %candidate,
                    assigned_by = by.as_deref().unwrap_or("unknown"),
                    "Candidate was assigned before, trying next"
                );
                continue;
            }
            AssignmentLookup::LookupFailed(reason) => {
                warn!(
                    issue,
                    candidate = %candidate,
                    %reason,
                    "Assignment lookup failed, treating candidate as not assigned"
                );
            }
            AssignmentLookup::NotAssigned => {}
        }

        executor.assign(issue, candidate).await?;
        return Ok(Some(candidate.clone()));
    }

    Ok(None)
}

/// Assign a random identity from the roster and mark the issue as needing
/// triage. Vacationing identities are never picked.
///
/// Every failure here is logged and reported through the outcome; nothing
/// propagates to the caller.
pub async fn resolve_fallback<R: Rng + ?Sized>(
    executor: &ActionExecutor,
    roster: &RosterHandle,
    policy: &Policy,
    rng: &mut R,
    issue: u64,
    diagnostic: bool,
) -> IssueOutcome {
    let snapshot = roster.snapshot().await;
    if let RosterSnapshot::Unavailable { reason } = snapshot.as_ref() {
        info!(issue, %reason, "No roster available, leaving issue unassigned");
        return IssueOutcome::Unassigned;
    }

    let Some(chosen) = snapshot.pick(rng, |identity| policy.is_vacationing(identity)) else {
        info!(issue, "Roster has no eligible identities, leaving issue unassigned");
        return IssueOutcome::Unassigned;
    };

    if diagnostic {
        info!(issue, assignee = chosen, "Diagnostic mode, not assigning roster pick");
        return IssueOutcome::Unassigned;
    }

    if let Err(e) = executor.add_label(issue, TRIAGE_NEEDED_LABEL).await {
        error!(issue, error = %e, "Failed to add triage label for fallback assignment");
        return IssueOutcome::Failed {
            error: format!("fallback label: {e}"),
        };
    }
    if let Err(e) = executor.assign(issue, chosen).await {
        error!(issue, assignee = chosen, error = %e, "Fallback assignment failed");
        return IssueOutcome::Failed {
            error: format!("fallback assignment: {e}"),
        };
    }

    IssueOutcome::FallbackAssigned {
        assignee: chosen.to_string(),
    }
}
