//! Skip filter: decide whether an issue should be left alone.

use crate::settings::EngineOptions;
use crate::tracker::IssueState;
use serde::Serialize;

/// Why an issue was not triaged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The issue was merged or transferred after classification ran
    Renumbered { live_number: u64 },
    /// Someone already owns the issue
    AlreadyAssigned { assignee: String },
    /// A human applied a label outside the allow-list
    ForeignLabel { label: String },
    /// The batch listed this issue more than once
    Duplicate,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Renumbered { live_number } => write!(f, "renumbered to #{live_number}"),
            Self::AlreadyAssigned { assignee } => write!(f, "already assigned to {assignee}"),
            Self::ForeignLabel { label } => write!(f, "already labeled '{label}'"),
            Self::Duplicate => write!(f, "already handled in this run"),
        }
    }
}

/// Check the live issue against the batch entry.
///
/// The renumbering guard applies in every mode; the assignee and label
/// checks are lifted in diagnostic mode.
#[must_use]
pub fn check(
    recorded_number: u64,
    state: &IssueState,
    options: &EngineOptions,
) -> Option<SkipReason> {
    if state.number != recorded_number {
        return Some(SkipReason::Renumbered {
            live_number: state.number,
        });
    }

    if options.diagnostic {
        return None;
    }

    if let Some(assignee) = &state.current_assignee {
        return Some(SkipReason::AlreadyAssigned {
            assignee: assignee.clone(),
        });
    }

    state
        .current_labels
        .iter()
        .find(|label| !options.allows_label(label))
        .map(|label| SkipReason::ForeignLabel {
            label: label.clone(),
        })
}
