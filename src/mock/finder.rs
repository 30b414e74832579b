//! Canned job finder and SBOM download service

use std::collections::HashMap;
use std::sync::Mutex;

use crate::host::{Credentials, TransportError};
use crate::job::{JobFinder, JobLocation, LookupError};
use crate::projection::SbomFetcher;

/// Job finder answering from a fixed table
#[derive(Debug, Default)]
pub struct StaticJobFinder {
    jobs: HashMap<String, Vec<JobLocation>>,
    failure: Option<LookupError>,
    lookups: Mutex<Vec<String>>,
}

impl StaticJobFinder {
    /// Create a new finder that knows no jobs
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer lookups of `name` with `locations`
    pub fn with_job(mut self, name: &str, locations: Vec<JobLocation>) -> Self {
        self.jobs.insert(name.to_string(), locations);
        self
    }

    /// Fail every lookup with `error`
    pub fn failing(mut self, error: LookupError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Number of lookups so far
    pub fn lookups(&self) -> usize {
        self.lookups.lock().map(|l| l.len()).unwrap_or(0)
    }

    /// Names looked up so far, in order
    pub fn looked_up(&self) -> Vec<String> {
        self.lookups.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl JobFinder for StaticJobFinder {
    fn lookup(&self, job_name: &str) -> Result<Vec<JobLocation>, LookupError> {
        if let Ok(mut lookups) = self.lookups.lock() {
            lookups.push(job_name.to_string());
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self.jobs.get(job_name).cloned().unwrap_or_default())
    }
}

/// SBOM download service answering from a fixed table
#[derive(Debug, Default)]
pub struct StaticSbomFetcher {
    documents: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl StaticSbomFetcher {
    /// Create a new fetcher without documents
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for `url`
    pub fn with_document(mut self, url: &str, content: impl Into<Vec<u8>>) -> Self {
        self.documents.insert(url.to_string(), content.into());
        self
    }

    /// Requests so far: url and user name
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl SbomFetcher for StaticSbomFetcher {
    fn fetch(&self, url: &str, credentials: &Credentials) -> Result<Vec<u8>, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((url.to_string(), credentials.username.clone()));
        }
        self.documents.get(url).cloned().ok_or_else(|| TransportError::Http {
            status: 404,
            url: url.to_string(),
        })
    }
}
