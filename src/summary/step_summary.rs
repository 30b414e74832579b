//! Step summary (`<step>_summary.json`)

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::build::{Build, BuildType};

use super::failure::{ErrorCategory, ExitCode, Status};

/// Schema version for the step summary
pub const SUMMARY_SCHEMA_VERSION: u32 = 1;

/// Schema identifier for the step summary
pub const SUMMARY_SCHEMA_ID: &str = "xmake-lane/summary@1";

/// Outcome of one stage or promote invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSummary {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// Build type that was requested
    pub build_type: BuildType,

    /// When the summary was created
    pub created_at: DateTime<Utc>,

    pub status: Status,

    /// Error category (when status is not success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,

    /// Stable exit code
    pub exit_code: i32,

    /// Canonical job name, once it could be constructed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_url: Option<String>,

    /// Terminal build result, e.g. `FAILURE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_result: Option<String>,

    /// Diagnosed downstream errors, job name to message
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,

    /// Human-readable summary
    pub human_summary: String,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl StepSummary {
    /// Create a new success summary
    pub fn success(build_type: BuildType, duration_ms: u64) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION,
            schema_id: SUMMARY_SCHEMA_ID.to_string(),
            build_type,
            created_at: Utc::now(),
            status: Status::Success,
            error_category: None,
            exit_code: ExitCode::Success.as_i32(),
            job_name: None,
            build_url: None,
            build_result: None,
            errors: BTreeMap::new(),
            human_summary: "Build succeeded".to_string(),
            duration_ms,
        }
    }

    /// Create a new failure summary
    pub fn failure(build_type: BuildType, category: ErrorCategory, human_summary: String, duration_ms: u64) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION,
            schema_id: SUMMARY_SCHEMA_ID.to_string(),
            build_type,
            created_at: Utc::now(),
            status: category.status(),
            error_category: Some(category),
            exit_code: category.exit_code().as_i32(),
            job_name: None,
            build_url: None,
            build_result: None,
            errors: BTreeMap::new(),
            human_summary,
            duration_ms,
        }
    }

    /// Set the job name
    pub fn with_job_name(mut self, job_name: impl Into<String>) -> Self {
        self.job_name = Some(job_name.into());
        self
    }

    /// Record the build url and its result
    pub fn with_build(mut self, build: &Build) -> Self {
        self.build_url = Some(build.url.clone());
        self.build_result = Some(build.result.as_str().to_string());
        self
    }

    /// Add diagnosed errors
    pub fn with_errors(mut self, errors: BTreeMap<String, String>) -> Self {
        self.errors = errors;
        self
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e)))?;
        fs::write(path, json)
    }

    /// Get the exit code as ExitCode enum
    pub fn exit_code_enum(&self) -> Option<ExitCode> {
        ExitCode::from_i32(self.exit_code)
    }
}

/// File name of the summary for `step_name`
pub fn summary_file_name(step_name: &str) -> String {
    format!("{}_summary.json", step_name)
}
