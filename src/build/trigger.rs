//! Trigger a job build

use crate::host::{Session, TransportError};
use crate::summary::ErrorCategory;

use super::{Build, BuildParameters};

/// Trigger errors
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    /// The orchestrator answered 404 on a job the job finder knows
    #[error("failed to trigger job '{job}'. The job exists but you don't have enough permission to execute this job. Please check Jenkins credentials used to trigger this job")]
    PermissionDenied { job: String, source: TransportError },

    #[error("failed to trigger job '{job}': {source}")]
    Failed { job: String, source: TransportError },
}

impl TriggerError {
    fn from_transport(job: &str, source: TransportError) -> Self {
        let job = job.to_string();
        match source.status() {
            Some(404) => TriggerError::PermissionDenied { job, source },
            _ => TriggerError::Failed { job, source },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TriggerError::PermissionDenied { .. } => ErrorCategory::Configuration,
            TriggerError::Failed { .. } => ErrorCategory::Infrastructure,
        }
    }
}

/// Start a build of `job_full_name`
pub fn trigger_build(
    session: &dyn Session,
    job_full_name: &str,
    parameters: &BuildParameters,
) -> Result<Build, TriggerError> {
    let build = session
        .trigger(job_full_name, parameters)
        .map_err(|e| TriggerError::from_transport(job_full_name, e))?;
    tracing::info!("Build started: {}", build.url);
    Ok(build)
}
