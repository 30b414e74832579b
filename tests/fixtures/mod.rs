//! Shared setup for lane integration tests
//!
//! A `Lane` bundles a temporary workspace, a job finder that knows one job
//! and a mock orchestrator hosting it.

#![allow(dead_code)]

use std::time::Duration;

use tempfile::TempDir;
use xmake_lane::build::{Build, BuildResult, BuildType};
use xmake_lane::config::LaneSettings;
use xmake_lane::host::Credentials;
use xmake_lane::job::{JobLocation, JobNameRequest};
use xmake_lane::mock::{MockOrchestrator, StaticJobFinder, StaticSbomFetcher};
use xmake_lane::pipeline::{Pipeline, PipelineDeps, PipelineError, PipelineOutcome, PipelineRequest};
use xmake_lane::retry::RetryPolicy;
use xmake_lane::summary::StepSummary;
use xmake_lane::workspace::Workspace;
use xmake_rules::RuleSet;

pub const JENKINS: &str = "https://xmake-jenkins.example";
pub const OWNER: &str = "ppiper";
pub const REPOSITORY: &str = "app";
pub const JOB_NAME: &str = "ppiper-app-SP-MS-common";
pub const JOB_FULL_NAME: &str = "ppiper/ppiper-app-SP-MS-common";
pub const STEP: &str = "xmakeExecuteBuild";

pub fn location() -> JobLocation {
    JobLocation {
        name: JOB_NAME.to_string(),
        full_name: JOB_FULL_NAME.to_string(),
        url: format!("{}/job/ppiper/job/{}/", JENKINS, JOB_NAME),
        landscape: "prod".to_string(),
        jenkins_url: JENKINS.to_string(),
        branch: "main".to_string(),
    }
}

pub fn job_request() -> JobNameRequest {
    JobNameRequest {
        owner: OWNER.to_string(),
        repository: REPOSITORY.to_string(),
        quality: "Milestone".to_string(),
        pattern: "GitHub-Internal".to_string(),
        ..Default::default()
    }
}

pub fn request(build_type: BuildType) -> PipelineRequest {
    PipelineRequest {
        build_type,
        job: job_request(),
        commit_id: "0123abcd".to_string(),
        staging_repository_id: match build_type {
            BuildType::Stage => String::new(),
            BuildType::Promote => "repo-4711".to_string(),
        },
        job_parameters: vec!["EXTRA=1".to_string()],
        credentials: Credentials::new("user", "token"),
    }
}

/// Settings without delays
pub fn fast_settings() -> LaneSettings {
    let mut settings = LaneSettings::default();
    settings.connect = RetryPolicy::immediate(5);
    settings.artifact_fetch = RetryPolicy::immediate(5);
    settings.wait.poll_interval = Duration::ZERO;
    settings
}

/// Everything one pipeline run needs
pub struct Lane {
    pub dir: TempDir,
    pub workspace: Workspace,
    pub finder: StaticJobFinder,
    pub orchestrator: MockOrchestrator,
    pub sbom: StaticSbomFetcher,
    pub rules: RuleSet,
    pub settings: LaneSettings,
}

impl Lane {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        Self {
            dir,
            workspace,
            finder: StaticJobFinder::new().with_job(JOB_NAME, vec![location()]),
            orchestrator: MockOrchestrator::new(JENKINS),
            sbom: StaticSbomFetcher::new(),
            rules: RuleSet::builtin(),
            settings: fast_settings(),
        }
    }

    /// The build the next trigger starts, answering polls with `results`
    pub fn schedule(&self, number: u64, results: Vec<BuildResult>) -> Build {
        self.orchestrator.schedule_build(JOB_FULL_NAME, number, results)
    }

    pub fn run(&self, build_type: BuildType) -> (Result<PipelineOutcome, PipelineError>, StepSummary, Pipeline<'_>) {
        let deps = PipelineDeps {
            finder: &self.finder,
            connector: &self.orchestrator,
            sbom_fetcher: Some(&self.sbom),
            rules: &self.rules,
            workspace: &self.workspace,
        };
        let mut pipeline = Pipeline::new(deps, self.settings.clone());
        let (result, summary) = pipeline.run_summarized(&request(build_type));
        (result, summary, pipeline)
    }

    pub fn read(&self, name: &str) -> String {
        String::from_utf8(self.workspace.read_file(name).unwrap()).unwrap()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.workspace.read_file(name).is_ok()
    }

    pub fn read_json(&self, name: &str) -> serde_json::Value {
        serde_json::from_str(&self.read(name)).unwrap()
    }
}
