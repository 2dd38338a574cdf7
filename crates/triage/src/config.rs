//! Triage policy
//!
//! The policy document lists vacationing users, per-category assignment rules
//! and per-assignee metadata. It is parsed once at process start and passed by
//! reference into the engine.
//!
//! ```yaml
//! vacation: [alice]
//! labels:
//!   bug:
//!     accuracy: 0.82
//!     assign: [alice, bob]
//! assignees:
//!   carol:
//!     accuracy: 0.7
//! ```
//!
//! JSON is accepted as well since it is a subset of YAML.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Assignment rule for one area category.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct LabelRule {
    /// Measured classifier accuracy for this category (informational)
    #[serde(default)]
    pub accuracy: Option<f64>,

    /// Identities to try, in order, when this category is confidently predicted
    #[serde(default, rename = "assign")]
    pub assign_candidates: Vec<String>,
}

/// Metadata for one assignee category.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AssigneeInfo {
    /// Measured classifier accuracy for this assignee (informational)
    #[serde(default)]
    pub accuracy: Option<f64>,
}

/// Raw policy document as it appears on disk.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct PolicyDocument {
    #[serde(default)]
    vacation: Vec<String>,

    #[serde(default)]
    labels: BTreeMap<String, LabelRule>,

    #[serde(default)]
    assignees: BTreeMap<String, AssigneeInfo>,
}

/// Immutable policy for a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policy {
    pub vacationing: BTreeSet<String>,
    pub label_rules: BTreeMap<String, LabelRule>,
    pub assignees: BTreeMap<String, AssigneeInfo>,
}

impl Policy {
    /// Load the policy document from a file.
    ///
    /// # Errors
    /// Returns `ConfigError::Read` if the file cannot be read, otherwise see
    /// [`Policy::parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Parse a policy document from YAML or JSON text.
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` for malformed documents and
    /// `ConfigError::InvalidAccuracy` for accuracy values outside `[0, 1]`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let doc: PolicyDocument = if raw.trim().is_empty() {
            PolicyDocument::default()
        } else {
            serde_yaml::from_str(raw)?
        };

        for (key, rule) in &doc.labels {
            check_accuracy(key, rule.accuracy)?;
        }
        for (key, info) in &doc.assignees {
            check_accuracy(key, info.accuracy)?;
        }

        Ok(Self {
            vacationing: doc.vacation.into_iter().collect(),
            label_rules: doc.labels,
            assignees: doc.assignees,
        })
    }

    /// Whether the identity is currently on vacation.
    #[must_use]
    pub fn is_vacationing(&self, identity: &str) -> bool {
        self.vacationing.contains(identity)
    }

    /// Configured assignment candidates for an area category, in config order.
    #[must_use]
    pub fn candidates_for(&self, category: &str) -> &[String] {
        self.label_rules
            .get(category)
            .map(|rule| rule.assign_candidates.as_slice())
            .unwrap_or_default()
    }
}

fn check_accuracy(key: &str, accuracy: Option<f64>) -> Result<(), ConfigError> {
    match accuracy {
        Some(value) if !(0.0..=1.0).contains(&value) => Err(ConfigError::InvalidAccuracy {
            key: key.to_string(),
            value,
        }),
        _ => Ok(()),
    }
}
