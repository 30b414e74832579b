//! Orchestrator session abstraction
//!
//! Everything the lane needs from a Jenkins instance sits behind two traits:
//! - Connector: authenticates against an endpoint and opens a session
//! - Session: trigger, poll, artifact and console access for one endpoint
//!
//! `JenkinsConnector` talks REST; `MockOrchestrator` serves tests in-process.

use std::fmt;

use crate::build::{Build, BuildParameters, BuildResult};

/// Basic-auth credentials for the orchestrator and the job finder
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl Credentials {
    /// Create a new credential pair
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Transport errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Request did not produce a response; the message is reported verbatim
    #[error("{0}")]
    Connection(String),

    #[error("HTTP Status: {status} for '{url}'")]
    Http { status: u16, url: String },

    #[error("artifact '{0}' not found")]
    ArtifactNotFound(String),

    #[error("Invalid response from '{url}': {message}")]
    InvalidResponse { url: String, message: String },

    #[error("Build of job '{0}' was cancelled before it started")]
    QueueCancelled(String),

    #[error("Build of job '{0}' did not leave the queue in time")]
    QueueTimeout(String),
}

impl TransportError {
    /// HTTP status of the failed request, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A file attached to a build. Content is loaded on first access.
pub trait Artifact {
    /// Name the build published the file under
    fn file_name(&self) -> &str;

    /// File content
    fn data(&self) -> Result<Vec<u8>, TransportError>;
}

/// An authenticated connection to one orchestrator endpoint
pub trait Session {
    /// Base URL of the orchestrator
    fn endpoint(&self) -> &str;

    /// Start a build of `job_full_name` and return it once it left the queue
    fn trigger(&self, job_full_name: &str, parameters: &BuildParameters) -> Result<Build, TransportError>;

    /// Current state of a build
    fn poll(&self, build: &Build) -> Result<BuildResult, TransportError>;

    /// Look up an artifact of a build by file name
    fn fetch_artifact(&self, build: &Build, file_name: &str) -> Result<Box<dyn Artifact>, TransportError>;

    /// Full console log of a build
    fn console_output(&self, build: &Build) -> Result<String, TransportError>;

    /// Build `number` of the job at `job_path` (`folder/job/name`)
    fn locate_build(&self, job_path: &str, number: u64) -> Result<Build, TransportError>;
}

/// Opens sessions
pub trait Connector {
    /// Authenticate against `endpoint`
    fn connect(&self, endpoint: &str, credentials: &Credentials) -> Result<Box<dyn Session>, TransportError>;
}

/// In-memory artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticArtifact {
    file_name: String,
    content: Vec<u8>,
}

impl StaticArtifact {
    /// Create a new in-memory artifact
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

impl Artifact for StaticArtifact {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn data(&self) -> Result<Vec<u8>, TransportError> {
        Ok(self.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_is_verbatim() {
        assert_eq!(TransportError::Connection("EOF".to_string()).to_string(), "EOF");
    }

    #[test]
    fn test_status() {
        let err = TransportError::Http {
            status: 404,
            url: "https://jenkins/job/a/".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(TransportError::Connection("x".to_string()).status(), None);
    }

    #[test]
    fn test_credentials_debug_hides_token() {
        let creds = Credentials::new("user", "s3cr3t");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("user"));
        assert!(!debug.contains("s3cr3t"));
    }

    #[test]
    fn test_static_artifact() {
        let artifact = StaticArtifact::new("build-results.json", b"{}".to_vec());
        assert_eq!(artifact.file_name(), "build-results.json");
        assert_eq!(artifact.data().unwrap(), b"{}");
    }
}
