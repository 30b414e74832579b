//! Failure taxonomy and stable exit codes

use serde::{Deserialize, Serialize};

/// Outcome of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Build finished with SUCCESS and results were projected
    Success,
    /// Build ran but did not succeed
    Failed,
    /// Invocation aborted before a terminal build result was known
    Aborted,
}

impl Status {
    /// Check if this is a failure state
    pub fn is_failure(&self) -> bool {
        !matches!(self, Status::Success)
    }
}

/// Error category - who has to act on a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Invalid inputs, unresolvable job, missing permissions
    Configuration,
    /// Orchestrator unreachable or misbehaving
    Infrastructure,
    /// The build itself failed
    Build,
}

impl ErrorCategory {
    /// Get the stable exit code for this category
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ErrorCategory::Configuration => ExitCode::Configuration,
            ErrorCategory::Infrastructure => ExitCode::Infrastructure,
            ErrorCategory::Build => ExitCode::BuildFailed,
        }
    }

    /// Status reported for an error of this category
    pub fn status(&self) -> Status {
        match self {
            ErrorCategory::Build => Status::Failed,
            ErrorCategory::Configuration | ErrorCategory::Infrastructure => Status::Aborted,
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "Configuration error",
            ErrorCategory::Infrastructure => "Infrastructure error",
            ErrorCategory::Build => "Build failed",
        }
    }
}

/// Stable process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[repr(i32)]
pub enum ExitCode {
    /// Build succeeded
    #[default]
    Success = 0,
    /// Configuration error
    Configuration = 10,
    /// Infrastructure error
    Infrastructure = 20,
    /// Build finished with a result other than SUCCESS
    BuildFailed = 50,
}

impl ExitCode {
    /// Get the integer value of the exit code
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Create from integer value
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExitCode::Success),
            10 => Some(ExitCode::Configuration),
            20 => Some(ExitCode::Infrastructure),
            50 => Some(ExitCode::BuildFailed),
            _ => None,
        }
    }

    /// Check if this exit code indicates success
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_exit_codes() {
        assert_eq!(ErrorCategory::Configuration.exit_code().as_i32(), 10);
        assert_eq!(ErrorCategory::Infrastructure.exit_code().as_i32(), 20);
        assert_eq!(ErrorCategory::Build.exit_code().as_i32(), 50);
    }

    #[test]
    fn test_exit_code_round_trip() {
        for code in [0, 10, 20, 50] {
            assert_eq!(ExitCode::from_i32(code).unwrap().as_i32(), code);
        }
        assert_eq!(ExitCode::from_i32(1), None);
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&ErrorCategory::Infrastructure).unwrap();
        assert_eq!(json, "\"INFRASTRUCTURE\"");
    }

    #[test]
    fn test_category_status() {
        assert_eq!(ErrorCategory::Build.status(), Status::Failed);
        assert_eq!(ErrorCategory::Configuration.status(), Status::Aborted);
        assert!(Status::Aborted.is_failure());
        assert!(!Status::Success.is_failure());
    }
}
