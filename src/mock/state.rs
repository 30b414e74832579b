//! Mock orchestrator state
//!
//! Builds, their scripted poll results, artifacts and console logs.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::build::{Build, BuildParameters, BuildResult};
use crate::host::jenkins::{job_url, short_job_name};
use crate::host::TransportError;

use super::failure::Operation;

/// Key of a build: job segments without `job` separators, plus the number
pub type BuildKey = (String, u64);

/// Normalize `folder/job/name` and `folder/name` to the same key
pub fn build_key(job_path: &str, number: u64) -> BuildKey {
    let segments: Vec<&str> = job_path
        .split('/')
        .filter(|s| !s.is_empty() && *s != "job")
        .collect();
    (segments.join("/"), number)
}

/// A build known to the mock
#[derive(Debug, Clone)]
pub struct MockBuild {
    pub build: Build,
    /// Poll answers, consumed in order; the last one repeats
    pub polls: VecDeque<Result<BuildResult, TransportError>>,
    pub artifacts: BTreeMap<String, Vec<u8>>,
    pub console: Option<String>,
}

impl MockBuild {
    /// Create a new running build at `endpoint`
    pub fn new(endpoint: &str, job_path: &str, number: u64, polls: Vec<Result<BuildResult, TransportError>>) -> Self {
        let url = format!("{}/{}/", job_url(endpoint, job_path), number);
        Self {
            build: Build::new(short_job_name(job_path), number, url),
            polls: polls.into(),
            artifacts: BTreeMap::new(),
            console: None,
        }
    }

    /// Next poll answer
    pub fn next_poll(&mut self) -> Result<BuildResult, TransportError> {
        let answer = if self.polls.len() > 1 {
            self.polls.pop_front()
        } else {
            self.polls.front().cloned()
        };
        let answer = answer.unwrap_or(Ok(BuildResult::Success));
        if let Ok(result) = &answer {
            self.build.record(*result);
        }
        answer
    }
}

/// Mutable state behind a mock orchestrator
#[derive(Debug, Default)]
pub struct MockState {
    builds: HashMap<BuildKey, MockBuild>,
    /// Builds handed out by the next trigger of a job, keyed by job segments
    scheduled: HashMap<String, VecDeque<BuildKey>>,
    triggered: Vec<(String, BuildParameters)>,
    calls: HashMap<Operation, u32>,
    next_number: u64,
}

impl MockState {
    /// Create an empty state
    pub fn new() -> Self {
        Self {
            next_number: 1,
            ..Default::default()
        }
    }

    pub fn record_call(&mut self, op: Operation) {
        *self.calls.entry(op).or_insert(0) += 1;
    }

    pub fn call_count(&self, op: Operation) -> u32 {
        self.calls.get(&op).copied().unwrap_or(0)
    }

    /// Register a build; replaces an existing one with the same key
    pub fn insert(&mut self, job_path: &str, build: MockBuild) -> Build {
        let key = build_key(job_path, build.build.number);
        let snapshot = build.build.clone();
        self.next_number = self.next_number.max(build.build.number + 1);
        self.builds.insert(key, build);
        snapshot
    }

    /// Make `key` the answer to the next trigger of `job_path`
    pub fn schedule(&mut self, job_path: &str, key: BuildKey) {
        let (job, _) = build_key(job_path, 0);
        self.scheduled.entry(job).or_default().push_back(key);
    }

    /// Record a trigger and return the build it started
    pub fn trigger(&mut self, endpoint: &str, job_full_name: &str, parameters: &BuildParameters) -> Build {
        self.triggered.push((job_full_name.to_string(), parameters.clone()));

        let (job, _) = build_key(job_full_name, 0);
        if let Some(key) = self.scheduled.get_mut(&job).and_then(VecDeque::pop_front) {
            if let Some(build) = self.builds.get(&key) {
                return build.build.clone();
            }
        }

        let number = self.next_number;
        let build = MockBuild::new(endpoint, job_full_name, number, vec![Ok(BuildResult::Success)]);
        self.insert(job_full_name, build)
    }

    pub fn triggered(&self) -> Vec<(String, BuildParameters)> {
        self.triggered.clone()
    }

    pub fn by_url_mut(&mut self, url: &str) -> Option<&mut MockBuild> {
        self.builds.values_mut().find(|b| b.build.url == url)
    }

    pub fn by_url(&self, url: &str) -> Option<&MockBuild> {
        self.builds.values().find(|b| b.build.url == url)
    }

    pub fn get(&self, key: &BuildKey) -> Option<&MockBuild> {
        self.builds.get(key)
    }

    pub fn get_mut(&mut self, key: &BuildKey) -> Option<&mut MockBuild> {
        self.builds.get_mut(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_key_normalizes_job_path() {
        assert_eq!(build_key("a/job/b", 3), build_key("a/b", 3));
        assert_eq!(build_key("a/job/b", 3).0, "a/b");
    }

    #[test]
    fn test_last_poll_repeats() {
        let mut build = MockBuild::new("https://j", "f/job/app", 1, vec![Ok(BuildResult::Running)]);
        assert_eq!(build.next_poll(), Ok(BuildResult::Running));
        assert_eq!(build.next_poll(), Ok(BuildResult::Running));
        assert_eq!(build.build.url, "https://j/job/f/job/app/1/");
    }

    #[test]
    fn test_unscheduled_trigger_numbers_builds() {
        let mut state = MockState::new();
        let params = BuildParameters::default();
        let first = state.trigger("https://j", "f/app", &params);
        let second = state.trigger("https://j", "f/app", &params);
        assert_eq!(first.number, 1);
        assert_eq!(second.number, 2);
        assert_eq!(state.triggered().len(), 2);
    }
}
