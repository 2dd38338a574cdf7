//! Verdict planning
//!
//! Turns one classification into the per-verdict actions and the ordered,
//! vacation-filtered candidate list. Pure: no tracker calls happen here.

use crate::batch::{IssueClassification, Verdict, VerdictKind};
use crate::config::Policy;
use crate::telemetry::TelemetryEvent;
use tracing::debug;

/// Color of diagnostic labels created for area verdicts.
pub const AREA_LABEL_COLOR: &str = "f1d9ff";

/// Color of diagnostic labels created for assignee verdicts.
pub const ASSIGNEE_LABEL_COLOR: &str = "ffa5a1";

/// Label attached alongside a random fallback assignment.
pub const TRIAGE_NEEDED_LABEL: &str = "triage-needed";

/// Label to create and attach in diagnostic mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticLabel {
    pub name: String,
    pub color: &'static str,
}

/// What to do with a single verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum VerdictAction {
    /// Diagnostic mode: show the verdict without acting on it
    Annotate {
        label: Option<DiagnosticLabel>,
        comment: String,
    },
    /// Confident verdict in normal mode
    Perform { event: TelemetryEvent },
    /// Nothing to do
    Skip,
}

/// Actions derived for one issue.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSet {
    pub area: VerdictAction,
    pub assignee: VerdictAction,
    /// Area-derived candidates first, then the suggested assignee
    pub candidates: Vec<String>,
}

impl ActionSet {
    #[must_use]
    pub const fn action(&self, kind: VerdictKind) -> &VerdictAction {
        match kind {
            VerdictKind::Area => &self.area,
            VerdictKind::Assignee => &self.assignee,
        }
    }
}

const fn label_color(kind: VerdictKind) -> &'static str {
    match kind {
        VerdictKind::Area => AREA_LABEL_COLOR,
        VerdictKind::Assignee => ASSIGNEE_LABEL_COLOR,
    }
}

fn diagnostic_comment(kind: VerdictKind, verdict: &Verdict) -> String {
    let threshold = if verdict.confident {
        "meets"
    } else {
        "does not meet"
    };
    format!(
        "Classifier {kind} prediction `{}` with confidence {:.4}: {threshold} the threshold.",
        verdict.category, verdict.confidence
    )
}

/// Derive the action set for one classification.
#[must_use]
pub fn plan(
    classification: &IssueClassification,
    policy: &Policy,
    diagnostic: bool,
) -> ActionSet {
    let issue = classification.issue_number;
    let area = &classification.area;
    let assignee = &classification.assignee;

    if diagnostic {
        let area_action = VerdictAction::Annotate {
            label: Some(DiagnosticLabel {
                name: area.category.clone(),
                color: label_color(VerdictKind::Area),
            }),
            comment: diagnostic_comment(VerdictKind::Area, area),
        };
        // Same name as the area label: attach it once
        let assignee_label = (assignee.category != area.category).then(|| DiagnosticLabel {
            name: assignee.category.clone(),
            color: label_color(VerdictKind::Assignee),
        });
        let assignee_action = VerdictAction::Annotate {
            label: assignee_label,
            comment: diagnostic_comment(VerdictKind::Assignee, assignee),
        };

        return ActionSet {
            area: area_action,
            assignee: assignee_action,
            candidates: Vec::new(),
        };
    }

    let mut candidates: Vec<String> = Vec::new();
    let mut push_candidate = |identity: &str| {
        if policy.is_vacationing(identity) {
            debug!(issue, candidate = identity, "Skipping vacationing candidate");
        } else if !candidates.iter().any(|c| c == identity) {
            candidates.push(identity.to_string());
        }
    };

    let area_action = if area.confident {
        // The area label itself is only attached in diagnostic mode
        debug!(issue, category = %area.category, "Area verdict confident");
        for identity in policy.candidates_for(&area.category) {
            push_candidate(identity.as_str());
        }
        VerdictAction::Perform {
            event: TelemetryEvent::label_applied(issue, &area.category),
        }
    } else {
        VerdictAction::Skip
    };

    let assignee_action = if assignee.confident {
        push_candidate(assignee.category.as_str());
        VerdictAction::Perform {
            event: TelemetryEvent::assignee_applied(issue, &assignee.category),
        }
    } else {
        VerdictAction::Skip
    };

    ActionSet {
        area: area_action,
        assignee: assignee_action,
        candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> Policy {
        Policy::parse(
            "vacation: [alice]\nlabels:\n  bug:\n    assign: [alice, bob]\n  perf:\n    assign: [carol]\n",
        )
        .unwrap()
    }

    fn classification(area: Verdict, assignee: Verdict) -> IssueClassification {
        IssueClassification {
            issue_number: 42,
            area,
            assignee,
        }
    }

    #[test]
    fn test_vacationing_area_candidate_is_filtered() {
        let actions = plan(
            &classification(
                Verdict::new("bug", 0.9, true),
                Verdict::new("alice", 0.3, false),
            ),
            &policy(),
            false,
        );

        assert_eq!(actions.candidates, vec!["bob"]);
        assert_eq!(
            actions.area,
            VerdictAction::Perform {
                event: TelemetryEvent::label_applied(42, "bug")
            }
        );
        assert_eq!(actions.assignee, VerdictAction::Skip);
    }

    #[test]
    fn test_area_candidates_come_before_suggested_assignee() {
        let actions = plan(
            &classification(
                Verdict::new("perf", 0.8, true),
                Verdict::new("dave", 0.7, true),
            ),
            &policy(),
            false,
        );
        assert_eq!(actions.candidates, vec!["carol", "dave"]);
        assert_eq!(
            actions.action(VerdictKind::Assignee),
            &VerdictAction::Perform {
                event: TelemetryEvent::assignee_applied(42, "dave")
            }
        );
    }

    #[test]
    fn test_vacationing_suggested_assignee_still_reports_telemetry() {
        let actions = plan(
            &classification(
                Verdict::new("docs", 0.1, false),
                Verdict::new("alice", 0.95, true),
            ),
            &policy(),
            false,
        );
        assert!(actions.candidates.is_empty());
        assert!(matches!(actions.assignee, VerdictAction::Perform { .. }));
    }

    #[test]
    fn test_duplicate_candidates_collapse() {
        let actions = plan(
            &classification(
                Verdict::new("bug", 0.9, true),
                Verdict::new("bob", 0.9, true),
            ),
            &policy(),
            false,
        );
        assert_eq!(actions.candidates, vec!["bob"]);
    }

    #[test]
    fn test_unconfident_verdicts_do_nothing() {
        let actions = plan(
            &classification(
                Verdict::new("bug", 0.4, false),
                Verdict::new("bob", 0.2, false),
            ),
            &policy(),
            false,
        );
        assert_eq!(actions.area, VerdictAction::Skip);
        assert_eq!(actions.assignee, VerdictAction::Skip);
        assert!(actions.candidates.is_empty());
    }

    #[test]
    fn test_diagnostic_mode_annotates_regardless_of_confidence() {
        let actions = plan(
            &classification(
                Verdict::new("bug", 0.91, true),
                Verdict::new("bob", 0.2, false),
            ),
            &policy(),
            true,
        );

        assert!(actions.candidates.is_empty());
        match &actions.area {
            VerdictAction::Annotate { label, comment } => {
                assert_eq!(
                    label.as_ref().unwrap(),
                    &DiagnosticLabel {
                        name: "bug".to_string(),
                        color: AREA_LABEL_COLOR
                    }
                );
                assert!(comment.contains("0.9100"));
                assert!(comment.contains("meets the threshold"));
            }
            other => panic!("unexpected area action {other:?}"),
        }
        match &actions.assignee {
            VerdictAction::Annotate { label, comment } => {
                assert_eq!(label.as_ref().unwrap().color, ASSIGNEE_LABEL_COLOR);
                assert!(comment.contains("does not meet"));
            }
            other => panic!("unexpected assignee action {other:?}"),
        }
    }

    #[test]
    fn test_diagnostic_label_attached_once_when_categories_match() {
        let actions = plan(
            &classification(
                Verdict::new("same", 0.5, true),
                Verdict::new("same", 0.5, true),
            ),
            &policy(),
            true,
        );
        assert!(matches!(actions.assignee, VerdictAction::Annotate { label: None, .. }));
    }
}
