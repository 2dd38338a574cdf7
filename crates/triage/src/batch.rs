//! Classification batch
//!
//! Pre-computed classifier output: one record per issue, processed in file
//! order. `confident` is the classifier's own threshold decision and is never
//! re-derived from `confidence` here.

use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// A classification result for one dimension of an issue.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Verdict {
    pub category: String,
    pub confidence: f64,
    pub confident: bool,
}

impl Verdict {
    #[must_use]
    pub fn new(category: impl Into<String>, confidence: f64, confident: bool) -> Self {
        Self {
            category: category.into(),
            confidence,
            confident,
        }
    }
}

/// Which dimension a verdict classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictKind {
    /// Topic label
    Area,
    /// Owner suggestion
    Assignee,
}

impl VerdictKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Area => "area",
            Self::Assignee => "assignee",
        }
    }
}

impl std::fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Both verdicts for one tracked issue.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IssueClassification {
    #[serde(rename = "number")]
    pub issue_number: u64,
    pub area: Verdict,
    pub assignee: Verdict,
}

impl IssueClassification {
    /// The verdict for the given dimension.
    #[must_use]
    pub const fn verdict(&self, kind: VerdictKind) -> &Verdict {
        match kind {
            VerdictKind::Area => &self.area,
            VerdictKind::Assignee => &self.assignee,
        }
    }
}

/// Ordered set of classifications to process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationBatch {
    entries: Vec<IssueClassification>,
}

impl ClassificationBatch {
    /// Build a batch from already-parsed entries, validating each one.
    ///
    /// # Errors
    /// Returns `BatchError::InvalidConfidence` or `BatchError::EmptyCategory`
    /// for the first invalid verdict.
    pub fn new(entries: Vec<IssueClassification>) -> Result<Self, BatchError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            for kind in [VerdictKind::Area, VerdictKind::Assignee] {
                validate(entry.issue_number, kind, entry.verdict(kind))?;
            }
            if !seen.insert(entry.issue_number) {
                warn!(
                    issue = entry.issue_number,
                    "Issue appears more than once in the batch"
                );
            }
        }
        Ok(Self { entries })
    }

    /// Load a batch from a JSON file.
    ///
    /// # Errors
    /// Returns `BatchError::Read` if the file cannot be read, otherwise see
    /// [`ClassificationBatch::parse`].
    pub fn load(path: &Path) -> Result<Self, BatchError> {
        let raw = std::fs::read_to_string(path).map_err(|source| BatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Parse a batch from JSON text.
    ///
    /// # Errors
    /// Returns `BatchError::Parse` for malformed JSON and a validation error
    /// for out-of-range confidences or empty categories.
    pub fn parse(raw: &str) -> Result<Self, BatchError> {
        let entries: Vec<IssueClassification> = serde_json::from_str(raw)?;
        Self::new(entries)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IssueClassification> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ClassificationBatch {
    type Item = &'a IssueClassification;
    type IntoIter = std::slice::Iter<'a, IssueClassification>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn validate(issue: u64, kind: VerdictKind, verdict: &Verdict) -> Result<(), BatchError> {
    if verdict.category.trim().is_empty() {
        return Err(BatchError::EmptyCategory {
            issue,
            kind: kind.as_str(),
        });
    }
    if !verdict.confidence.is_finite() || !(0.0..=1.0).contains(&verdict.confidence) {
        return Err(BatchError::InvalidConfidence {
            issue,
            kind: kind.as_str(),
            value: verdict.confidence,
        });
    }
    Ok(())
}
