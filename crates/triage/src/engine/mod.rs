//! # Triage Engine
//!
//! Processes one classified issue at a time:
//!
//! 1. Re-read the live issue and run the skip filter ([`skip`])
//! 2. Plan per-verdict actions and assignment candidates ([`plan`])
//! 3. Apply both verdicts concurrently
//! 4. Try direct assignment, then the random roster fallback ([`assign`])
//!
//! Failures are contained per issue: the engine never returns an error, it
//! reports an [`IssueOutcome`] instead.

pub mod assign;
pub mod plan;
pub mod skip;

use crate::batch::{IssueClassification, VerdictKind};
use crate::config::Policy;
use crate::executor::ActionExecutor;
use crate::roster::RosterHandle;
use crate::settings::EngineOptions;
use rand::rngs::StdRng;
use serde::Serialize;
use skip::SkipReason;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// What happened to one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IssueOutcome {
    Skipped {
        #[serde(flatten)]
        reason: SkipReason,
    },
    DirectAssigned {
        assignee: String,
    },
    FallbackAssigned {
        assignee: String,
    },
    /// Verdicts applied, nobody assigned
    Unassigned,
    Failed {
        error: String,
    },
}

impl IssueOutcome {
    #[must_use]
    pub fn assignee(&self) -> Option<&str> {
        match self {
            Self::DirectAssigned { assignee } | Self::FallbackAssigned { assignee } => {
                Some(assignee)
            }
            _ => None,
        }
    }
}

/// Per-run decision engine.
pub struct TriageEngine<'a> {
    policy: &'a Policy,
    options: &'a EngineOptions,
    executor: &'a ActionExecutor,
    roster: RosterHandle,
    rng: StdRng,
    seen: HashSet<u64>,
}

impl<'a> TriageEngine<'a> {
    #[must_use]
    pub fn new(
        policy: &'a Policy,
        options: &'a EngineOptions,
        executor: &'a ActionExecutor,
        roster: RosterHandle,
        rng: StdRng,
    ) -> Self {
        Self {
            policy,
            options,
            executor,
            roster,
            rng,
            seen: HashSet::new(),
        }
    }

    /// Triage a single issue.
    ///
    /// An issue number already handled by this engine is skipped, so labels
    /// and comments land at most once per issue per run.
    pub async fn process(&mut self, classification: &IssueClassification) -> IssueOutcome {
        let issue = classification.issue_number;
        let diagnostic = self.options.diagnostic;

        if !self.seen.insert(issue) {
            info!(issue, "Issue already handled in this run, skipping repeat entry");
            return IssueOutcome::Skipped {
                reason: SkipReason::Duplicate,
            };
        }

        let state = match self.executor.fetch_issue(issue).await {
            Ok(state) => state,
            Err(e) => {
                error!(issue, error = %e, "Failed to read issue");
                return IssueOutcome::Failed {
                    error: format!("read issue: {e}"),
                };
            }
        };

        if let Some(reason) = skip::check(issue, &state, self.options) {
            info!(issue, %reason, "Skipping issue");
            return IssueOutcome::Skipped { reason };
        }

        let actions = plan::plan(classification, self.policy, diagnostic);
        debug!(issue, candidates = ?actions.candidates, "Planned actions");

        let (area, assignee) = tokio::join!(
            self.executor.apply_verdict(issue, actions.action(VerdictKind::Area)),
            self.executor.apply_verdict(issue, actions.action(VerdictKind::Assignee)),
        );
        for (kind, result) in [(VerdictKind::Area, area), (VerdictKind::Assignee, assignee)] {
            if let Err(e) = result {
                warn!(issue, verdict = %kind, error = %e, "Failed to apply verdict");
            }
        }

        if !diagnostic {
            match assign::resolve_direct(self.executor, issue, &actions.candidates).await {
                Ok(Some(assignee)) => return IssueOutcome::DirectAssigned { assignee },
                Ok(None) => {}
                Err(e) => {
                    error!(issue, error = %e, "Direct assignment failed");
                    return IssueOutcome::Failed {
                        error: format!("direct assignment: {e}"),
                    };
                }
            }
        }

        assign::resolve_fallback(
            self.executor,
            &self.roster,
            self.policy,
            &mut self.rng,
            issue,
            diagnostic,
        )
        .await
    }
}
