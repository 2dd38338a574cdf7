//! In-memory collaborators shared by the scenario tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use triage::error::{RosterError, TelemetryError, TrackerError};
use triage::{IssueState, IssueTracker, RosterProvider, TelemetryEvent, TelemetrySink};

/// A side effect the engine asked the tracker to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateLabel { name: String, color: String },
    AddLabel { issue: u64, label: String },
    AddAssignee { issue: u64, login: String },
    Comment { issue: u64, body: String },
}

#[derive(Default)]
struct TrackerState {
    issues: HashMap<u64, IssueState>,
    labels: HashSet<String>,
    prior_assignments: HashSet<(u64, String)>,
    failing_reads: HashSet<u64>,
    failing_lookups: HashSet<u64>,
    failing_assignees: HashSet<String>,
    calls: Vec<Call>,
    label_checks: usize,
}

/// Tracker fake that records every mutating call.
#[derive(Clone, Default)]
pub struct FakeTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issue(self, state: IssueState) -> Self {
        self.state.lock().unwrap().issues.insert(state.number, state);
        self
    }

    /// Register `recorded` as a lookup that resolves to a different live number.
    pub fn with_renumbered(self, recorded: u64, live: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .issues
            .insert(recorded, IssueState::new(live));
        self
    }

    pub fn with_label(self, name: &str) -> Self {
        self.state.lock().unwrap().labels.insert(name.to_string());
        self
    }

    pub fn with_prior_assignment(self, issue: u64, login: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .prior_assignments
            .insert((issue, login.to_string()));
        self
    }

    pub fn failing_read(self, issue: u64) -> Self {
        self.state.lock().unwrap().failing_reads.insert(issue);
        self
    }

    pub fn failing_lookup(self, issue: u64) -> Self {
        self.state.lock().unwrap().failing_lookups.insert(issue);
        self
    }

    pub fn failing_assignee(self, login: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_assignees
            .insert(login.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_for(&self, issue: u64) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                Call::AddLabel { issue: n, .. }
                | Call::AddAssignee { issue: n, .. }
                | Call::Comment { issue: n, .. } => *n == issue,
                Call::CreateLabel { .. } => false,
            })
            .collect()
    }

    pub fn created_labels(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateLabel { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn assignees(&self, issue: u64) -> Vec<String> {
        self.calls_for(issue)
            .into_iter()
            .filter_map(|call| match call {
                Call::AddAssignee { login, .. } => Some(login),
                _ => None,
            })
            .collect()
    }

    pub fn issue_labels(&self, issue: u64) -> Vec<String> {
        self.calls_for(issue)
            .into_iter()
            .filter_map(|call| match call {
                Call::AddLabel { label, .. } => Some(label),
                _ => None,
            })
            .collect()
    }

    pub fn label_checks(&self) -> usize {
        self.state.lock().unwrap().label_checks
    }
}

fn record(state: &Arc<Mutex<TrackerState>>, call: Call) {
    state.lock().unwrap().calls.push(call);
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn get_issue(&self, number: u64) -> Result<IssueState, TrackerError> {
        let state = self.state.lock().unwrap();
        if state.failing_reads.contains(&number) {
            return Err(TrackerError::Api {
                status: 502,
                message: "Bad Gateway".to_string(),
            });
        }
        Ok(state
            .issues
            .get(&number)
            .cloned()
            .unwrap_or_else(|| IssueState::new(number)))
    }

    async fn label_exists(&self, name: &str) -> Result<bool, TrackerError> {
        let mut state = self.state.lock().unwrap();
        state.label_checks += 1;
        Ok(state.labels.contains(name))
    }

    async fn create_label(&self, name: &str, color: &str) -> Result<(), TrackerError> {
        self.state.lock().unwrap().labels.insert(name.to_string());
        record(
            &self.state,
            Call::CreateLabel {
                name: name.to_string(),
                color: color.to_string(),
            },
        );
        Ok(())
    }

    async fn add_label(&self, number: u64, label: &str) -> Result<(), TrackerError> {
        record(
            &self.state,
            Call::AddLabel {
                issue: number,
                label: label.to_string(),
            },
        );
        Ok(())
    }

    async fn add_assignee(&self, number: u64, login: &str) -> Result<(), TrackerError> {
        if self.state.lock().unwrap().failing_assignees.contains(login) {
            return Err(TrackerError::Api {
                status: 422,
                message: format!("{login} cannot be assigned"),
            });
        }
        record(
            &self.state,
            Call::AddAssignee {
                issue: number,
                login: login.to_string(),
            },
        );
        Ok(())
    }

    async fn post_comment(&self, number: u64, body: &str) -> Result<(), TrackerError> {
        record(
            &self.state,
            Call::Comment {
                issue: number,
                body: body.to_string(),
            },
        );
        Ok(())
    }

    async fn find_assignment(
        &self,
        number: u64,
        login: &str,
    ) -> Result<Option<String>, TrackerError> {
        let state = self.state.lock().unwrap();
        if state.failing_lookups.contains(&number) {
            return Err(TrackerError::Other("events endpoint timed out".to_string()));
        }
        Ok(state
            .prior_assignments
            .contains(&(number, login.to_string()))
            .then(|| "maintainer".to_string()))
    }
}

/// Telemetry sink that keeps every event.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelemetrySink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn record(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Roster provider backed by a fixed list, or a failure.
pub struct StaticRoster {
    identities: Result<BTreeSet<String>, String>,
}

impl StaticRoster {
    pub fn new(identities: &[&str]) -> Self {
        Self {
            identities: Ok(identities.iter().map(ToString::to_string).collect()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            identities: Err(reason.to_string()),
        }
    }
}

#[async_trait]
impl RosterProvider for StaticRoster {
    async fn fetch_eligible_identities(&self) -> Result<BTreeSet<String>, RosterError> {
        self.identities
            .clone()
            .map_err(RosterError::Connection)
    }
}
