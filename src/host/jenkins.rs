//! Jenkins REST session
//!
//! Blocking HTTP client for the handful of Jenkins endpoints the lane uses:
//! - `GET  <base>/api/json`                      connection probe
//! - `POST <job>/buildWithParameters`            trigger, answers with a queue item
//! - `GET  <queue item>/api/json`                wait for the build number
//! - `GET  <build>/api/json`                     state and artifact list
//! - `GET  <build>/artifact/<relativePath>`      artifact content
//! - `GET  <build>/consoleText`                  console log

use std::cell::OnceCell;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::LOCATION;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::build::{Build, BuildParameters, BuildResult};

use super::transport::{Artifact, Connector, Credentials, Session, TransportError};

/// Jenkins connector configuration
#[derive(Debug, Clone)]
pub struct JenkinsConfig {
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Pause between two queue item polls after a trigger
    pub queue_poll_interval: Duration,
    /// Maximum number of queue item polls
    pub queue_poll_attempts: u32,
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            queue_poll_interval: Duration::from_secs(1),
            queue_poll_attempts: 300,
        }
    }
}

/// Opens REST sessions against Jenkins instances
#[derive(Debug, Clone)]
pub struct JenkinsConnector {
    client: Client,
    config: JenkinsConfig,
}

impl JenkinsConnector {
    /// Create a new connector
    pub fn new(config: JenkinsConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

impl Connector for JenkinsConnector {
    fn connect(&self, endpoint: &str, credentials: &Credentials) -> Result<Box<dyn Session>, TransportError> {
        let session = JenkinsSession {
            client: self.client.clone(),
            base: endpoint.trim_end_matches('/').to_string(),
            credentials: credentials.clone(),
            config: self.config.clone(),
        };
        // Fails on unreachable hosts and rejected credentials alike.
        let _: serde_json::Value = session.get_json(&format!("{}/api/json", session.base))?;
        Ok(Box::new(session))
    }
}

/// Authenticated session on one Jenkins instance
#[derive(Debug)]
pub struct JenkinsSession {
    client: Client,
    base: String,
    credentials: Credentials,
    config: JenkinsConfig,
}

#[derive(Debug, Deserialize)]
struct QueueItem {
    #[serde(default)]
    cancelled: bool,
    #[serde(default)]
    executable: Option<Executable>,
}

#[derive(Debug, Deserialize)]
struct Executable {
    number: u64,
    url: String,
}

#[derive(Debug, Deserialize)]
struct BuildState {
    #[serde(default)]
    number: u64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    building: bool,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    artifacts: Vec<ArtifactEntry>,
}

#[derive(Debug, Deserialize)]
struct ArtifactEntry {
    #[serde(rename = "fileName")]
    file_name: String,
    #[serde(rename = "relativePath")]
    relative_path: String,
}

impl JenkinsSession {
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.credentials.username, Some(&self.credentials.token))
    }

    fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, TransportError> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, TransportError> {
        let response = self.send(self.client.get(url), url)?;
        response.json().map_err(|e| TransportError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn build_state(&self, build_url: &str) -> Result<BuildState, TransportError> {
        self.get_json(&format!("{}/api/json", build_url.trim_end_matches('/')))
    }

    /// Follow a queue item until Jenkins assigned a build number
    fn await_executable(&self, job_full_name: &str, queue_url: &str) -> Result<Executable, TransportError> {
        let url = format!("{}/api/json", queue_url.trim_end_matches('/'));
        for attempt in 1..=self.config.queue_poll_attempts {
            let item: QueueItem = self.get_json(&url)?;
            if item.cancelled {
                return Err(TransportError::QueueCancelled(job_full_name.to_string()));
            }
            if let Some(executable) = item.executable {
                return Ok(executable);
            }
            tracing::debug!(attempt, "build of '{}' still queued", job_full_name);
            std::thread::sleep(self.config.queue_poll_interval);
        }
        Err(TransportError::QueueTimeout(job_full_name.to_string()))
    }
}

/// URL of a job given its full name (`folder/name`) or path (`folder/job/name`)
pub fn job_url(base: &str, job_full_name: &str) -> String {
    let segments: Vec<&str> = job_full_name
        .split('/')
        .filter(|s| !s.is_empty() && *s != "job")
        .collect();
    format!("{}/job/{}", base.trim_end_matches('/'), segments.join("/job/"))
}

/// Short job name: the last segment of a full name or job path
pub fn short_job_name(job_full_name: &str) -> &str {
    job_full_name
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(job_full_name)
}

impl Session for JenkinsSession {
    fn endpoint(&self) -> &str {
        &self.base
    }

    fn trigger(&self, job_full_name: &str, parameters: &BuildParameters) -> Result<Build, TransportError> {
        let url = format!("{}/buildWithParameters", job_url(&self.base, job_full_name));
        let response = self.send(self.client.post(&url).form(parameters.as_map()), &url)?;

        let queue_url = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| TransportError::InvalidResponse {
                url: url.clone(),
                message: "missing queue item location".to_string(),
            })?;

        let executable = self.await_executable(job_full_name, &queue_url)?;
        Ok(Build::new(short_job_name(job_full_name), executable.number, executable.url))
    }

    fn poll(&self, build: &Build) -> Result<BuildResult, TransportError> {
        let state = self.build_state(&build.url)?;
        Ok(BuildResult::from_jenkins(state.building, state.result.as_deref()))
    }

    fn fetch_artifact(&self, build: &Build, file_name: &str) -> Result<Box<dyn Artifact>, TransportError> {
        let state = self.build_state(&build.url)?;
        let entry = state
            .artifacts
            .into_iter()
            .find(|a| a.file_name == file_name)
            .ok_or_else(|| TransportError::ArtifactNotFound(file_name.to_string()))?;

        Ok(Box::new(JenkinsArtifact {
            client: self.client.clone(),
            credentials: self.credentials.clone(),
            url: format!("{}/artifact/{}", build.url.trim_end_matches('/'), entry.relative_path),
            file_name: entry.file_name,
            content: OnceCell::new(),
        }))
    }

    fn console_output(&self, build: &Build) -> Result<String, TransportError> {
        let url = format!("{}/consoleText", build.url.trim_end_matches('/'));
        let response = self.send(self.client.get(&url), &url)?;
        response.text().map_err(|e| TransportError::Connection(e.to_string()))
    }

    fn locate_build(&self, job_path: &str, number: u64) -> Result<Build, TransportError> {
        let url = format!("{}/{}", job_url(&self.base, job_path), number);
        let state = self.build_state(&url)?;
        let build_url = if state.url.is_empty() { url } else { state.url };
        let number = if state.number == 0 { number } else { state.number };
        let mut build = Build::new(short_job_name(job_path), number, build_url);
        build.result = BuildResult::from_jenkins(state.building, state.result.as_deref());
        Ok(build)
    }
}

/// Artifact downloaded on first access
struct JenkinsArtifact {
    client: Client,
    credentials: Credentials,
    url: String,
    file_name: String,
    content: OnceCell<Vec<u8>>,
}

impl Artifact for JenkinsArtifact {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn data(&self) -> Result<Vec<u8>, TransportError> {
        if let Some(content) = self.content.get() {
            return Ok(content.clone());
        }

        let response = self
            .client
            .get(&self.url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.token))
            .send()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        if !response.status().is_success() {
            return Err(TransportError::Http {
                status: response.status().as_u16(),
                url: self.url.clone(),
            });
        }
        let bytes = response
            .bytes()
            .map_err(|e| TransportError::Connection(e.to_string()))?
            .to_vec();

        let _ = self.content.set(bytes.clone());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_url_from_full_name() {
        assert_eq!(
            job_url("https://jenkins.example/", "piper-validation/piper-validation-golang-SP-MS-common"),
            "https://jenkins.example/job/piper-validation/job/piper-validation-golang-SP-MS-common"
        );
    }

    #[test]
    fn test_job_url_from_job_path() {
        assert_eq!(
            job_url("https://jenkins.example", "a/job/b"),
            "https://jenkins.example/job/a/job/b"
        );
    }

    #[test]
    fn test_short_job_name() {
        assert_eq!(short_job_name("folder/job/name"), "name");
        assert_eq!(short_job_name("folder/name/"), "name");
        assert_eq!(short_job_name("name"), "name");
    }

    #[test]
    fn test_connect_unreachable_host() {
        let connector = JenkinsConnector::new(JenkinsConfig {
            request_timeout: Duration::from_millis(500),
            ..Default::default()
        })
        .unwrap();

        // Port 9 (discard) on localhost is expected to refuse connections.
        let result = connector.connect("http://127.0.0.1:9", &Credentials::new("u", "t"));
        assert!(matches!(result, Err(TransportError::Connection(_))));
    }
}
