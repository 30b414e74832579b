//! Job finder service client
//!
//! The job finder maps a canonical job name to the Jenkins instance(s)
//! hosting it: `GET <service>/job_finder/api/json?input=<name>`.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::host::Credentials;

/// Default job finder service
pub const DEFAULT_SERVICE_URL: &str = "https://xmake-nova.wdf.sap.corp/";

/// Path of the lookup endpoint below the service URL
const SERVICE_ENDPOINT: &str = "job_finder/api/json";

/// A job location reported by the job finder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobLocation {
    #[serde(default)]
    pub name: String,
    /// Folder-qualified name (`folder/name`)
    #[serde(rename = "fullName", default)]
    pub full_name: String,
    /// Job URL
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub landscape: String,
    /// Base URL of the hosting Jenkins instance
    #[serde(rename = "jenkinsUrl", default)]
    pub jenkins_url: String,
    #[serde(default)]
    pub branch: String,
}

#[derive(Debug, Deserialize)]
struct JobMatches {
    #[serde(rename = "job", default)]
    jobs: Option<Vec<JobLocation>>,
}

/// Job finder errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("No response received from the server or connection was dropped. Error: {0}")]
    NoResponse(String),

    #[error("Jenkins server error: service unavailable. HTTP Status: {0}. Error: {1}")]
    ServerError(u16, String),

    #[error("Jenkins client error: possible incorrect credentials or bad request. HTTP Status: {0}. Error: {1}")]
    ClientError(u16, String),

    #[error("unexpected HTTP Status: {0}")]
    UnexpectedStatus(u16),

    #[error("error reading response body: {0}")]
    Body(String),

    #[error("error unmarshalling response: {0}")]
    Decode(String),
}

impl LookupError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, reason: &str) -> Self {
        match status {
            500..=u16::MAX => LookupError::ServerError(status, reason.to_string()),
            400..=499 => LookupError::ClientError(status, reason.to_string()),
            _ => LookupError::UnexpectedStatus(status),
        }
    }
}

/// Resolves job names to job locations
pub trait JobFinder {
    /// All locations registered for `job_name`, possibly none
    fn lookup(&self, job_name: &str) -> Result<Vec<JobLocation>, LookupError>;
}

/// Parse a job finder response body
pub fn parse_matches(body: &[u8]) -> Result<Vec<JobLocation>, LookupError> {
    let matches: JobMatches =
        serde_json::from_slice(body).map_err(|e| LookupError::Decode(e.to_string()))?;
    Ok(matches.jobs.unwrap_or_default())
}

/// HTTP job finder
#[derive(Debug, Clone)]
pub struct HttpJobFinder {
    client: Client,
    service_url: String,
    credentials: Credentials,
}

impl HttpJobFinder {
    /// Create a new job finder client
    pub fn new(service_url: impl Into<String>, credentials: Credentials, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::NoResponse(e.to_string()))?;
        Ok(Self {
            client,
            service_url: service_url.into(),
            credentials,
        })
    }

    /// Lookup endpoint without query
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.service_url.trim_end_matches('/'), SERVICE_ENDPOINT)
    }
}

impl JobFinder for HttpJobFinder {
    fn lookup(&self, job_name: &str) -> Result<Vec<JobLocation>, LookupError> {
        tracing::info!("Looking up job in JobFinder: '{}'", job_name);
        tracing::info!("Sending request to JobFinder with user '{}'", self.credentials.username);

        let response = self
            .client
            .get(self.endpoint())
            .query(&[("input", job_name)])
            .basic_auth(&self.credentials.username, Some(&self.credentials.token))
            .send()
            .map_err(|e| {
                let err = LookupError::NoResponse(e.to_string());
                tracing::error!("{}", err);
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::from_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown"),
            ));
        }

        tracing::info!("Successfully retrieved xmake job URL from JobFinder: '{}'", self.endpoint());
        let body = response.bytes().map_err(|e| LookupError::Body(e.to_string()))?;
        parse_matches(&body)
    }
}
