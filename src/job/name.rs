//! Canonical xmake job names

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Template the legacy `xMakeJobNameTemplate` parameter defaulted to.
pub const DEFAULT_LEGACY_TEMPLATE: &str =
    "${githubOrg}-${githubRepo}-SP-${quality}-common${shipmentType?'_'+shipmentType:''}";

/// Prefix of job names on the tools landscape
const TOOLS_PREFIX: &str = "ght-";

/// Job name errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobNameError {
    #[error("job name pattern not supported: {0}")]
    UnsupportedPattern(String),

    #[error("owner not set")]
    OwnerNotSet,

    #[error("repository not set")]
    RepositoryNotSet,

    #[error("build quality not supported: {0}")]
    UnsupportedQuality(String),
}

/// Naming scheme of the landscape hosting the job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobNamePattern {
    #[serde(rename = "GitHub-Internal")]
    Internal,
    #[serde(rename = "GitHub-Tools")]
    Tools,
}

impl JobNamePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobNamePattern::Internal => "GitHub-Internal",
            JobNamePattern::Tools => "GitHub-Tools",
        }
    }

    /// Pattern implied by a concrete job name or template
    fn from_legacy(value: &str) -> Self {
        if value.starts_with(TOOLS_PREFIX) {
            JobNamePattern::Tools
        } else {
            JobNamePattern::Internal
        }
    }
}

impl fmt::Display for JobNamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobNamePattern {
    type Err = JobNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GitHub-Internal" => Ok(JobNamePattern::Internal),
            "GitHub-Tools" => Ok(JobNamePattern::Tools),
            other => Err(JobNameError::UnsupportedPattern(other.to_string())),
        }
    }
}

/// Build quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildQuality {
    Milestone,
    Release,
}

impl BuildQuality {
    /// Short code used inside job names
    pub fn code(&self) -> &'static str {
        match self {
            BuildQuality::Milestone => "MS",
            BuildQuality::Release => "REL",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildQuality::Milestone => "Milestone",
            BuildQuality::Release => "Release",
        }
    }
}

impl fmt::Display for BuildQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildQuality {
    type Err = JobNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Milestone" => Ok(BuildQuality::Milestone),
            "Release" => Ok(BuildQuality::Release),
            other => Err(JobNameError::UnsupportedQuality(other.to_string())),
        }
    }
}

/// Inputs of the job name.
///
/// Fields stay strings so validation can report the raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobNameRequest {
    pub owner: String,
    pub repository: String,
    pub quality: String,
    #[serde(default)]
    pub shipment_type: String,
    pub pattern: String,
    /// Deprecated: concrete job name
    #[serde(default)]
    pub legacy_job_name: String,
    /// Deprecated: job name template
    #[serde(default)]
    pub legacy_job_name_template: String,
}

impl JobNameRequest {
    /// Pattern after applying the deprecated parameters.
    ///
    /// A legacy job name wins over a legacy template, which wins over the
    /// explicit pattern. A template equal to the old default is ignored.
    pub fn effective_pattern(&self) -> String {
        if !self.legacy_job_name.is_empty() {
            tracing::warn!("Parameter 'xMakeJobName' is deprecated, please use jobNamePattern");
            return JobNamePattern::from_legacy(&self.legacy_job_name).as_str().to_string();
        }

        let template = self.legacy_job_name_template.as_str();
        if !template.is_empty() && template != DEFAULT_LEGACY_TEMPLATE {
            tracing::warn!("Parameter 'xMakeJobNameTemplate' is deprecated, please use jobNamePattern");
            return JobNamePattern::from_legacy(template).as_str().to_string();
        }

        self.pattern.clone()
    }

    /// Build the canonical job name
    pub fn job_name(&self) -> Result<String, JobNameError> {
        let pattern: JobNamePattern = self.effective_pattern().parse()?;
        if self.owner.is_empty() {
            return Err(JobNameError::OwnerNotSet);
        }
        if self.repository.is_empty() {
            return Err(JobNameError::RepositoryNotSet);
        }
        let quality: BuildQuality = self.quality.parse()?;

        Ok(job_name(pattern, &self.owner, &self.repository, quality, &self.shipment_type))
    }
}

/// `<owner>-<repository>-SP-<MS|REL>-common[_<shipment>]`, prefixed with
/// `ght-` on the tools landscape. Milestone builds never carry a shipment type.
pub fn job_name(
    pattern: JobNamePattern,
    owner: &str,
    repository: &str,
    quality: BuildQuality,
    shipment_type: &str,
) -> String {
    let shipment_type = match quality {
        BuildQuality::Milestone => "",
        BuildQuality::Release => shipment_type.trim(),
    };

    let mut name = format!("{}-{}-SP-{}-common", owner, repository, quality.code());
    if !shipment_type.is_empty() {
        name.push('_');
        name.push_str(shipment_type);
    }

    match pattern {
        JobNamePattern::Tools => format!("{}{}", TOOLS_PREFIX, name),
        JobNamePattern::Internal => name,
    }
}
