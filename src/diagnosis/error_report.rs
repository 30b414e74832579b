//! Job name to error message map

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Diagnosed errors, keyed by job name.
///
/// Iteration is sorted by job name. Merging is last-writer-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorReport(BTreeMap<String, String>);

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `job`, replacing an earlier one
    pub fn insert(&mut self, job: impl Into<String>, message: impl Into<String>) {
        self.0.insert(job.into(), message.into());
    }

    /// Merge `other` into this report; entries of `other` win
    pub fn merge(&mut self, other: ErrorReport) {
        self.0.extend(other.0);
    }

    pub fn get(&self, job: &str) -> Option<&str> {
        self.0.get(job).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl From<BTreeMap<String, String>> for ErrorReport {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}
