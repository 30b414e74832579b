//! Failure diagnosis
//!
//! When a build does not succeed, its primary result artifact names the
//! downstream builds that failed. Each of them is explained independently:
//! - the build's error dictionary artifact, if it can be fetched
//! - otherwise the first console line matching an error rule
//!
//! The explanations are merged into one `ErrorReport` and rendered into an
//! HTML side report. Nothing in here fails the invocation.

mod error_report;
mod explain;
mod links;
mod report;

pub use error_report::ErrorReport;
pub use explain::{explain_build, Explanation, ExplanationSource};
pub use links::{DownstreamLink, LinkError, CONSOLE_MARKER};
pub use report::{render_failure_report, FAILURE_REPORT_FILE};

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use xmake_protocol::{BuildResults, BUILD_RESULTS_FILE, ERROR_DICTIONARY_FILE};
use xmake_rules::RuleSet;

use crate::host::{Artifact, Session};
use crate::report::{persist_reports_and_links, ReportPath};
use crate::workspace::Workspace;

/// How failed downstream builds are discovered in the primary artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStrategy {
    /// `JOB_FAILURE`: console URLs of failed builds
    #[default]
    JobFailure,
    /// `DOWNSTREAMS`: job name to build URL of every downstream build
    Downstreams,
}

impl DiscoveryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryStrategy::JobFailure => "job_failure",
            DiscoveryStrategy::Downstreams => "downstreams",
        }
    }
}

impl fmt::Display for DiscoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscoveryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "job_failure" => Ok(DiscoveryStrategy::JobFailure),
            "downstreams" => Ok(DiscoveryStrategy::Downstreams),
            _ => Err(format!("unknown discovery strategy: {}", s)),
        }
    }
}

/// Diagnosis settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisConfig {
    pub strategy: DiscoveryStrategy,
    /// Downstream hops to follow; 1 explains the direct downstream builds only
    pub max_depth: u32,
    /// Per-build error dictionary artifact
    pub error_dictionary: String,
    /// Primary artifact of downstream builds, read when following further hops
    pub build_results: String,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            strategy: DiscoveryStrategy::JobFailure,
            max_depth: 1,
            error_dictionary: ERROR_DICTIONARY_FILE.to_string(),
            build_results: BUILD_RESULTS_FILE.to_string(),
        }
    }
}

/// Downstream links found in one primary artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub links: Vec<DownstreamLink>,
    /// Console URLs for the side report, malformed ones included
    pub console_links: Vec<String>,
    /// Links that could not be decomposed
    pub skipped: usize,
}

/// Outcome of a diagnosis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnosis {
    pub console_links: Vec<String>,
    pub errors: ErrorReport,
    /// Malformed links that were dropped
    pub skipped_links: usize,
    /// Side report location, when it could be written
    pub report_file: Option<PathBuf>,
}

/// Read downstream links out of primary artifact content
pub fn discover(content: &[u8], strategy: DiscoveryStrategy) -> Discovery {
    let results = match BuildResults::parse(content) {
        Ok(results) => results,
        Err(e) => {
            tracing::warn!("{}", e);
            return Discovery::default();
        }
    };

    let mut discovery = Discovery::default();
    match strategy {
        DiscoveryStrategy::JobFailure => {
            let urls = results.job_failure().unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                Vec::new()
            });
            for url in urls {
                tracing::info!("-> found xmake job failure link: {}", url);
                match DownstreamLink::from_console_url(&url) {
                    Ok(link) => discovery.links.push(link),
                    Err(e) => {
                        tracing::warn!("Dropping job failure link: {}", e);
                        discovery.skipped += 1;
                    }
                }
                discovery.console_links.push(url);
            }
        }
        DiscoveryStrategy::Downstreams => {
            let downstreams = results.downstreams().unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                Default::default()
            });
            for (job, url) in downstreams {
                tracing::debug!("parsed downstream job: '{}' with url: '{}'", job, url);
                match DownstreamLink::from_build_url(&url) {
                    Ok(link) => {
                        discovery.console_links.push(link.console_url());
                        discovery.links.push(link);
                    }
                    Err(e) => {
                        tracing::warn!("Dropping downstream '{}': {}", job, e);
                        discovery.skipped += 1;
                    }
                }
            }
        }
    }
    discovery
}

/// Walks failed downstream builds and explains each of them
pub struct Diagnoser<'a> {
    session: &'a dyn Session,
    rules: &'a RuleSet,
    config: DiagnosisConfig,
}

impl<'a> Diagnoser<'a> {
    /// Create a new diagnoser
    pub fn new(session: &'a dyn Session, rules: &'a RuleSet, config: DiagnosisConfig) -> Self {
        Self { session, rules, config }
    }

    /// Diagnose a failed build from its primary artifact, if one was retrieved
    pub fn diagnose(&self, primary: Option<&dyn Artifact>) -> Diagnosis {
        let discovery = match primary {
            Some(artifact) => {
                tracing::info!("Reading: {}", artifact.file_name());
                match artifact.data() {
                    Ok(content) => discover(&content, self.config.strategy),
                    Err(e) => {
                        tracing::warn!("failed to read build result artifact: '{}'", e);
                        Discovery::default()
                    }
                }
            }
            None => {
                tracing::warn!("No build result artifact available, no downstream builds to analyze");
                Discovery::default()
            }
        };

        let mut diagnosis = Diagnosis {
            console_links: discovery.console_links,
            skipped_links: discovery.skipped,
            ..Default::default()
        };

        let mut visited: HashSet<(String, u64)> = HashSet::new();
        let mut worklist: VecDeque<(DownstreamLink, u32)> = discovery.links.into_iter().map(|l| (l, 1)).collect();

        while let Some((link, depth)) = worklist.pop_front() {
            if !visited.insert((link.job_path.clone(), link.number)) {
                tracing::debug!("Skipping already analyzed build {}", link);
                continue;
            }

            let build = match self.session.locate_build(&link.job_path, link.number) {
                Ok(build) => build,
                Err(e) => {
                    tracing::warn!("Failed to get build instance from url: '{}': '{}'", link.url, e);
                    continue;
                }
            };

            if let Some(explanation) = explain_build(self.session, &build, self.rules, &self.config.error_dictionary) {
                let mut found = ErrorReport::new();
                found.insert(build.job_name.clone(), explanation.message);
                diagnosis.errors.merge(found);
            }

            if depth < self.config.max_depth {
                let nested = match self.session.fetch_artifact(&build, &self.config.build_results) {
                    Ok(artifact) => match artifact.data() {
                        Ok(content) => discover(&content, self.config.strategy),
                        Err(e) => {
                            tracing::debug!("No readable {} for {}: {}", self.config.build_results, link, e);
                            Discovery::default()
                        }
                    },
                    Err(e) => {
                        tracing::debug!("No {} for {}: {}", self.config.build_results, link, e);
                        Discovery::default()
                    }
                };
                diagnosis.skipped_links += nested.skipped;
                diagnosis.console_links.extend(nested.console_links);
                worklist.extend(nested.links.into_iter().map(|l| (l, depth + 1)));
            }
        }

        if diagnosis.skipped_links > 0 {
            tracing::warn!("{} downstream link(s) could not be analyzed", diagnosis.skipped_links);
        }
        for (job, message) in diagnosis.errors.iter() {
            tracing::info!("Job '{}' failed with error: '{}'", job, message);
        }
        diagnosis
    }
}

/// Write the HTML side report and register it in the reports manifest.
///
/// Failures are logged only.
pub fn write_failure_report(workspace: &Workspace, step_name: &str, diagnosis: &mut Diagnosis) {
    let html = render_failure_report(&diagnosis.errors, &diagnosis.console_links);
    match workspace.write_file(FAILURE_REPORT_FILE, html.as_bytes()) {
        Ok(path) => {
            diagnosis.report_file = Some(path);
            let reports = vec![ReportPath::optional(FAILURE_REPORT_FILE)];
            if let Err(e) = persist_reports_and_links(workspace, step_name, &reports, &[]) {
                tracing::warn!("failed to persist reports of '{}': '{}'", step_name, e);
            }
        }
        Err(e) => tracing::warn!("failed to write report '{}': '{}'", FAILURE_REPORT_FILE, e),
    }
}
