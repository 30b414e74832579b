//! Job identity resolution
//!
//! Turns naming parameters into the canonical xmake job name and resolves
//! it to a concrete Jenkins job through the job finder.

pub mod finder;
pub mod name;

pub use finder::{parse_matches, HttpJobFinder, JobFinder, JobLocation, LookupError, DEFAULT_SERVICE_URL};
pub use name::{job_name, BuildQuality, JobNameError, JobNamePattern, JobNameRequest, DEFAULT_LEGACY_TEMPLATE};

use crate::summary::ErrorCategory;

/// Job resolution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("failed to construct job name: {0}")]
    Name(#[from] JobNameError),

    #[error("failed to lookup job with name '{name}': {source}")]
    Lookup { name: String, source: LookupError },

    #[error("no jobs found with name '{0}'")]
    NotFound(String),
}

impl JobError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            JobError::Name(_) | JobError::NotFound(_) => ErrorCategory::Configuration,
            JobError::Lookup { .. } => ErrorCategory::Infrastructure,
        }
    }
}

/// A resolved job. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobIdentity {
    name: String,
    candidates: Vec<JobLocation>,
    selected: JobLocation,
}

impl JobIdentity {
    /// Canonical job name that was looked up
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every location the job finder reported
    pub fn candidates(&self) -> &[JobLocation] {
        &self.candidates
    }

    /// The location used for the build (the last candidate)
    pub fn selected(&self) -> &JobLocation {
        &self.selected
    }
}

/// Look up `job_name`; the last reported location wins
pub fn find_job(finder: &dyn JobFinder, job_name: &str) -> Result<JobIdentity, JobError> {
    let candidates = finder.lookup(job_name).map_err(|source| JobError::Lookup {
        name: job_name.to_string(),
        source,
    })?;

    let selected = candidates
        .last()
        .cloned()
        .ok_or_else(|| JobError::NotFound(job_name.to_string()))?;

    tracing::debug!("{} job(s) found", candidates.len());
    for job in &candidates {
        tracing::debug!(jenkins = %job.jenkins_url, url = %job.url, "JobName: {}", job.full_name);
    }

    Ok(JobIdentity {
        name: job_name.to_string(),
        candidates,
        selected,
    })
}

/// Build the job name from `request` and resolve it
pub fn resolve_job(finder: &dyn JobFinder, request: &JobNameRequest) -> Result<JobIdentity, JobError> {
    let name = request.job_name()?;
    tracing::debug!("Build Job: {}", name);
    find_job(finder, &name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::StaticJobFinder;

    fn location(full_name: &str, jenkins: &str) -> JobLocation {
        JobLocation {
            name: full_name.rsplit('/').next().unwrap().to_string(),
            full_name: full_name.to_string(),
            url: format!("{}/job/{}", jenkins, full_name.replace('/', "/job/")),
            jenkins_url: jenkins.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_last_candidate_selected() {
        let finder = StaticJobFinder::new().with_job(
            "a-b-SP-MS-common",
            vec![location("f1/a-b-SP-MS-common", "https://j1"), location("f2/a-b-SP-MS-common", "https://j2")],
        );

        let identity = find_job(&finder, "a-b-SP-MS-common").unwrap();
        assert_eq!(identity.name(), "a-b-SP-MS-common");
        assert_eq!(identity.candidates().len(), 2);
        assert_eq!(identity.selected().jenkins_url, "https://j2");
    }

    #[test]
    fn test_no_candidates() {
        let finder = StaticJobFinder::new();
        let err = find_job(&finder, "missing").unwrap_err();
        assert_eq!(err.to_string(), "no jobs found with name 'missing'");
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_lookup_failure_wrapped() {
        let finder = StaticJobFinder::new().failing(LookupError::ServerError(502, "Bad Gateway".to_string()));
        let err = find_job(&finder, "x").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("failed to lookup job with name 'x': Jenkins server error"));
        assert_eq!(err.category(), ErrorCategory::Infrastructure);
        assert_eq!(finder.lookups(), 1);
    }

    #[test]
    fn test_resolve_invalid_request() {
        let finder = StaticJobFinder::new();
        let request = JobNameRequest {
            owner: "o".to_string(),
            repository: "r".to_string(),
            quality: "Milestone".to_string(),
            pattern: "GitHub-Nope".to_string(),
            ..Default::default()
        };

        let err = resolve_job(&finder, &request).unwrap_err();
        assert_eq!(err.to_string(), "failed to construct job name: job name pattern not supported: GitHub-Nope");
        assert_eq!(finder.lookups(), 0);
    }

    #[test]
    fn test_resolve_with_legacy_name() {
        let finder = StaticJobFinder::new().with_job(
            "ght-o-r-SP-MS-common",
            vec![location("tools/ght-o-r-SP-MS-common", "https://tools")],
        );
        let request = JobNameRequest {
            owner: "o".to_string(),
            repository: "r".to_string(),
            quality: "Milestone".to_string(),
            pattern: "GitHub-Internal".to_string(),
            legacy_job_name: "ght-anything".to_string(),
            ..Default::default()
        };

        let identity = resolve_job(&finder, &request).unwrap();
        assert_eq!(identity.selected().jenkins_url, "https://tools");
    }
}
