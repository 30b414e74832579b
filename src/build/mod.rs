//! Build triggering and waiting
//!
//! Parameter assembly, the trigger call and the polling loop that blocks
//! until a build reached a terminal result.

pub mod params;
pub mod trigger;
pub mod wait;

pub use params::{BuildParameters, BuildType};
pub use trigger::{trigger_build, TriggerError};
pub use wait::{wait_for_terminal, WaitConfig, WaitError};

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of a build as reported by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    /// Queued or building
    Running,
    Success,
    Failure,
    Unstable,
    Aborted,
    NotBuilt,
    /// Finished with a result the lane does not know
    Unknown,
}

impl BuildResult {
    /// Map the Jenkins `building` flag and `result` field
    pub fn from_jenkins(building: bool, result: Option<&str>) -> Self {
        if building {
            return BuildResult::Running;
        }
        match result {
            None => BuildResult::Running,
            Some("SUCCESS") => BuildResult::Success,
            Some("FAILURE") => BuildResult::Failure,
            Some("UNSTABLE") => BuildResult::Unstable,
            Some("ABORTED") => BuildResult::Aborted,
            Some("NOT_BUILT") => BuildResult::NotBuilt,
            Some(_) => BuildResult::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildResult::Running => "RUNNING",
            BuildResult::Success => "SUCCESS",
            BuildResult::Failure => "FAILURE",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Aborted => "ABORTED",
            BuildResult::NotBuilt => "NOT_BUILT",
            BuildResult::Unknown => "UNKNOWN",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BuildResult::Running)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildResult::Success)
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One execution of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    /// Short name of the owning job
    pub job_name: String,
    pub number: u64,
    pub url: String,
    /// Only changed by polling; never leaves a terminal state
    pub result: BuildResult,
}

impl Build {
    /// Create a new, still running build
    pub fn new(job_name: impl Into<String>, number: u64, url: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            number,
            url: url.into(),
            result: BuildResult::Running,
        }
    }

    /// Record a polled result. Terminal results are final.
    pub fn record(&mut self, result: BuildResult) {
        if !self.result.is_terminal() {
            self.result = result;
        }
    }

    pub fn is_running(&self) -> bool {
        !self.result.is_terminal()
    }
}
