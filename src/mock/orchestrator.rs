//! In-process orchestrator
//!
//! Serves the `Connector` and `Session` traits from memory so the pipeline
//! can be exercised without a Jenkins instance. Every call is counted and
//! any operation can be failed through `inject`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::build::{Build, BuildParameters, BuildResult};
use crate::host::{Artifact, Connector, Credentials, Session, StaticArtifact, TransportError};

use super::failure::{FailureConfig, FailureInjector, Operation};
use super::state::{build_key, MockBuild, MockState};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock Jenkins instance
#[derive(Debug, Clone)]
pub struct MockOrchestrator {
    endpoint: String,
    state: Arc<Mutex<MockState>>,
    failures: Arc<Mutex<FailureInjector>>,
}

impl MockOrchestrator {
    /// Create a new mock serving `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            state: Arc::new(Mutex::new(MockState::new())),
            failures: Arc::new(Mutex::new(FailureInjector::new())),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Inject a failure for an operation
    pub fn inject(&self, op: Operation, config: FailureConfig) {
        lock(&self.failures).inject(op, config);
    }

    /// Clear all failure injections
    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    /// Number of calls of `op` so far, failed ones included
    pub fn call_count(&self, op: Operation) -> u32 {
        lock(&self.state).call_count(op)
    }

    /// Session on this mock without going through `connect`
    pub fn session(&self) -> MockSession {
        MockSession {
            orchestrator: self.clone(),
        }
    }

    /// Every trigger so far: job full name and parameters
    pub fn triggered(&self) -> Vec<(String, BuildParameters)> {
        lock(&self.state).triggered()
    }

    /// Register build `number` of `job_path` answering polls with `results`
    pub fn add_build(&self, job_path: &str, number: u64, results: Vec<BuildResult>) -> Build {
        self.add_build_with_polls(job_path, number, results.into_iter().map(Ok).collect())
    }

    /// Register a build whose polls may also fail
    pub fn add_build_with_polls(
        &self,
        job_path: &str,
        number: u64,
        polls: Vec<Result<BuildResult, TransportError>>,
    ) -> Build {
        let build = MockBuild::new(&self.endpoint, job_path, number, polls);
        lock(&self.state).insert(job_path, build)
    }

    /// Register a build that the next trigger of `job_full_name` starts
    pub fn schedule_build(&self, job_full_name: &str, number: u64, results: Vec<BuildResult>) -> Build {
        let build = self.add_build(job_full_name, number, results);
        lock(&self.state).schedule(job_full_name, build_key(job_full_name, number));
        build
    }

    /// Attach an artifact to a registered build
    pub fn add_artifact(&self, build: &Build, file_name: &str, content: impl Into<Vec<u8>>) {
        if let Some(entry) = lock(&self.state).by_url_mut(&build.url) {
            entry.artifacts.insert(file_name.to_string(), content.into());
        }
    }

    /// Set the console log of a registered build
    pub fn set_console(&self, build: &Build, console: impl Into<String>) {
        if let Some(entry) = lock(&self.state).by_url_mut(&build.url) {
            entry.console = Some(console.into());
        }
    }

    /// Count the call and apply any injected delay or failure
    fn enter(&self, op: Operation) -> Result<(), TransportError> {
        lock(&self.state).record_call(op);

        let (delay, failure) = {
            let mut failures = lock(&self.failures);
            (failures.get_delay(op), failures.check(op))
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn not_found(url: &str) -> TransportError {
        TransportError::Http {
            status: 404,
            url: url.to_string(),
        }
    }
}

impl Connector for MockOrchestrator {
    fn connect(&self, _endpoint: &str, _credentials: &Credentials) -> Result<Box<dyn Session>, TransportError> {
        self.enter(Operation::Connect)?;
        Ok(Box::new(self.session()))
    }
}

/// Session on a `MockOrchestrator`
#[derive(Debug, Clone)]
pub struct MockSession {
    orchestrator: MockOrchestrator,
}

impl Session for MockSession {
    fn endpoint(&self) -> &str {
        &self.orchestrator.endpoint
    }

    fn trigger(&self, job_full_name: &str, parameters: &BuildParameters) -> Result<Build, TransportError> {
        self.orchestrator.enter(Operation::Trigger)?;
        Ok(lock(&self.orchestrator.state).trigger(&self.orchestrator.endpoint, job_full_name, parameters))
    }

    fn poll(&self, build: &Build) -> Result<BuildResult, TransportError> {
        self.orchestrator.enter(Operation::Poll)?;
        let mut state = lock(&self.orchestrator.state);
        let entry = state
            .by_url_mut(&build.url)
            .ok_or_else(|| MockOrchestrator::not_found(&build.url))?;
        entry.next_poll()
    }

    fn fetch_artifact(&self, build: &Build, file_name: &str) -> Result<Box<dyn Artifact>, TransportError> {
        self.orchestrator.enter(Operation::FetchArtifact)?;
        let state = lock(&self.orchestrator.state);
        let entry = state
            .by_url(&build.url)
            .ok_or_else(|| MockOrchestrator::not_found(&build.url))?;
        let content = entry
            .artifacts
            .get(file_name)
            .ok_or_else(|| TransportError::ArtifactNotFound(file_name.to_string()))?;
        Ok(Box::new(StaticArtifact::new(file_name, content.clone())))
    }

    fn console_output(&self, build: &Build) -> Result<String, TransportError> {
        self.orchestrator.enter(Operation::ConsoleOutput)?;
        let state = lock(&self.orchestrator.state);
        state
            .by_url(&build.url)
            .and_then(|entry| entry.console.clone())
            .ok_or_else(|| MockOrchestrator::not_found(&format!("{}consoleText", build.url)))
    }

    fn locate_build(&self, job_path: &str, number: u64) -> Result<Build, TransportError> {
        self.orchestrator.enter(Operation::LocateBuild)?;
        let state = lock(&self.orchestrator.state);
        state
            .get(&build_key(job_path, number))
            .map(|entry| entry.build.clone())
            .ok_or_else(|| MockOrchestrator::not_found(&format!("{}/{}", job_path, number)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_counts_calls() {
        let orchestrator = MockOrchestrator::new("https://j/");
        let session = orchestrator.connect("https://j", &Credentials::default()).unwrap();
        assert_eq!(session.endpoint(), "https://j");
        assert_eq!(orchestrator.call_count(Operation::Connect), 1);
    }

    #[test]
    fn test_scheduled_build_returned_by_trigger() {
        let orchestrator = MockOrchestrator::new("https://j");
        let scheduled = orchestrator.schedule_build("folder/app", 42, vec![BuildResult::Failure]);
        let session = orchestrator.session();

        let build = session.trigger("folder/app", &BuildParameters::default()).unwrap();
        assert_eq!(build, scheduled);
        assert_eq!(build.number, 42);
        assert_eq!(session.poll(&build).unwrap(), BuildResult::Failure);
    }

    #[test]
    fn test_artifacts_and_console() {
        let orchestrator = MockOrchestrator::new("https://j");
        let build = orchestrator.add_build("a/job/b", 17, vec![BuildResult::Failure]);
        orchestrator.add_artifact(&build, "error_dictionary.json", b"{}".to_vec());
        orchestrator.set_console(&build, "line");
        let session = orchestrator.session();

        let artifact = session.fetch_artifact(&build, "error_dictionary.json").unwrap();
        assert_eq!(artifact.data().unwrap(), b"{}");
        assert!(matches!(
            session.fetch_artifact(&build, "build-results.json"),
            Err(TransportError::ArtifactNotFound(_))
        ));
        assert_eq!(session.console_output(&build).unwrap(), "line");

        let located = session.locate_build("a/job/b", 17).unwrap();
        assert_eq!(located.url, build.url);
        assert!(session.locate_build("a/job/b", 18).is_err());
    }

    #[test]
    fn test_injected_failure_not_counted_against_script() {
        let orchestrator = MockOrchestrator::new("https://j");
        orchestrator.inject(Operation::Poll, FailureConfig::error("EOF").with_fail_count(1));
        let build = orchestrator.add_build("f/app", 1, vec![BuildResult::Running, BuildResult::Success]);
        let session = orchestrator.session();

        assert!(session.poll(&build).is_err());
        assert_eq!(session.poll(&build).unwrap(), BuildResult::Running);
        assert_eq!(session.poll(&build).unwrap(), BuildResult::Success);
    }
}
