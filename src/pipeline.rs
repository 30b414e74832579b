//! Pipeline orchestration for one lane invocation
//!
//! Runs a stage or promote build end to end:
//! - Resolve the xmake job
//! - Connect to the job's Jenkins instance
//! - Trigger the build and wait for its result
//! - Retrieve the primary result artifact
//! - Diagnose a failed build, or project a successful one into the pipeline
//!   environment and the reports/links manifests
//!
//! Only job resolution, connecting, triggering and waiting abort an
//! invocation; everything after the build finished degrades to warnings.

use std::time::Instant;

use thiserror::Error;
use xmake_rules::RuleSet;

use crate::artifact::ArtifactRetriever;
use crate::build::{trigger_build, wait_for_terminal, Build, BuildParameters, BuildResult, BuildType, TriggerError, WaitError};
use crate::config::{ConfigError, LaneSettings};
use crate::diagnosis::{write_failure_report, Diagnoser, Diagnosis};
use crate::host::{connect_with_retry, ConnectError, Connector, Credentials};
use crate::job::{resolve_job, JobError, JobFinder, JobIdentity, JobNameRequest};
use crate::projection::{project, ArtifactFilter, FilterError, PipelineEnvironment, ProjectionContext, SbomFetcher};
use crate::report::{persist_reports_and_links, ReportPath};
use crate::summary::{ErrorCategory, ExitCode, StepSummary};
use crate::workspace::Workspace;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    InvalidPattern(#[from] FilterError),

    #[error("{0}")]
    Job(#[from] JobError),

    #[error("{0}")]
    Connect(#[from] ConnectError),

    #[error("{0}")]
    Trigger(#[from] TriggerError),

    #[error("Error occurred while waiting for build to finish: {0}")]
    Wait(#[from] WaitError),

    #[error("job did not succeed: {0}")]
    BuildFailed(BuildResult),
}

impl PipelineError {
    /// Who has to act on this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Config(_) | PipelineError::InvalidPattern(_) => ErrorCategory::Configuration,
            PipelineError::Job(e) => e.category(),
            PipelineError::Connect(_) | PipelineError::Wait(_) => ErrorCategory::Infrastructure,
            PipelineError::Trigger(e) => e.category(),
            PipelineError::BuildFailed(_) => ErrorCategory::Build,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        self.category().exit_code()
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Injected collaborators
#[derive(Clone, Copy)]
pub struct PipelineDeps<'a> {
    pub finder: &'a dyn JobFinder,
    pub connector: &'a dyn Connector,
    /// `None` disables the SBOM download
    pub sbom_fetcher: Option<&'a dyn SbomFetcher>,
    pub rules: &'a RuleSet,
    pub workspace: &'a Workspace,
}

/// Inputs of one invocation
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub build_type: BuildType,
    pub job: JobNameRequest,
    pub commit_id: String,
    /// Required by promote builds
    pub staging_repository_id: String,
    /// Free-form `KEY=VALUE` job parameters
    pub job_parameters: Vec<String>,
    pub credentials: Credentials,
}

/// Result of a successful invocation
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub build: Build,
    pub environment: PipelineEnvironment,
    pub reports: Vec<ReportPath>,
    pub links: Vec<ReportPath>,
}

/// Pipeline execution context
pub struct Pipeline<'a> {
    deps: PipelineDeps<'a>,
    settings: LaneSettings,
    job: Option<JobIdentity>,
    build: Option<Build>,
    environment: PipelineEnvironment,
    diagnosis: Option<Diagnosis>,
}

impl<'a> Pipeline<'a> {
    /// Create a new pipeline
    pub fn new(deps: PipelineDeps<'a>, settings: LaneSettings) -> Self {
        Self {
            deps,
            settings,
            job: None,
            build: None,
            environment: PipelineEnvironment::default(),
            diagnosis: None,
        }
    }

    pub fn settings(&self) -> &LaneSettings {
        &self.settings
    }

    /// The resolved job, once known
    pub fn job(&self) -> Option<&JobIdentity> {
        self.job.as_ref()
    }

    /// The triggered build, once known
    pub fn build(&self) -> Option<&Build> {
        self.build.as_ref()
    }

    /// Environment values collected so far; holds the job URL even when the
    /// invocation failed after triggering
    pub fn environment(&self) -> &PipelineEnvironment {
        &self.environment
    }

    /// Diagnosis of a failed build
    pub fn diagnosis(&self) -> Option<&Diagnosis> {
        self.diagnosis.as_ref()
    }

    /// Run the invocation
    pub fn run(&mut self, request: &PipelineRequest) -> PipelineResult<PipelineOutcome> {
        let filter = ArtifactFilter::new(&self.settings.artifact_pattern)?;

        let job = resolve_job(self.deps.finder, &request.job)?;
        let location = job.selected().clone();
        self.job = Some(job);

        let session = connect_with_retry(
            self.deps.connector,
            &location.jenkins_url,
            &request.credentials,
            &self.settings.connect,
        )?;

        tracing::info!("Triggering Jenkins Job: {}", location.url);
        self.environment.xmake_job_url = Some(location.url.clone());

        let parameters = BuildParameters::assemble(
            request.build_type,
            &request.commit_id,
            &request.staging_repository_id,
            &request.job_parameters,
        );
        let mut build = trigger_build(session.as_ref(), &location.full_name, &parameters)?;
        self.environment.xmake_job_url = Some(build.url.clone());
        self.build = Some(build.clone());

        let waited = wait_for_terminal(session.as_ref(), &mut build, &self.settings.wait);
        self.build = Some(build.clone());
        waited?;

        let report_file = request.build_type.report_file_name();
        let retriever = ArtifactRetriever::new(self.settings.artifact_fetch);
        let artifact = retriever.fetch(
            session.as_ref(),
            &build,
            &self.settings.artifact_name,
            report_file,
            self.deps.workspace,
        );

        if !build.result.is_success() {
            tracing::info!("Build {} finished with {}, analyzing failure", build.url, build.result);
            let diagnoser = Diagnoser::new(session.as_ref(), self.deps.rules, self.settings.diagnosis.clone());
            let mut diagnosis = diagnoser.diagnose(artifact.as_deref());
            write_failure_report(self.deps.workspace, &self.settings.step_name, &mut diagnosis);
            self.diagnosis = Some(diagnosis);
            return Err(PipelineError::BuildFailed(build.result));
        }

        let context = ProjectionContext {
            workspace: self.deps.workspace,
            filter: filter.as_ref(),
            sbom_fetcher: self.deps.sbom_fetcher.filter(|_| self.settings.sbom_download),
        };
        let projection = project(request.build_type, artifact.as_deref(), &context);
        let xmake_job_url = self.environment.xmake_job_url.take();
        self.environment = PipelineEnvironment {
            xmake_job_url,
            ..projection.environment
        };

        let mut reports = vec![ReportPath::mandatory(report_file)];
        reports.extend(projection.reports);
        let links = vec![ReportPath::link(request.build_type.link_title(), build.url.clone())];
        if let Err(e) = persist_reports_and_links(self.deps.workspace, &self.settings.step_name, &reports, &links) {
            tracing::warn!("failed to persist reports of '{}': '{}'", self.settings.step_name, e);
        }

        Ok(PipelineOutcome {
            build,
            environment: self.environment.clone(),
            reports,
            links,
        })
    }

    /// Run the invocation and summarize it
    pub fn run_summarized(&mut self, request: &PipelineRequest) -> (PipelineResult<PipelineOutcome>, StepSummary) {
        let start = Instant::now();
        let result = self.run(request);
        let summary = self.summarize(request.build_type, &result, start.elapsed().as_millis() as u64);
        (result, summary)
    }

    /// Step summary for a finished run
    pub fn summarize(
        &self,
        build_type: BuildType,
        result: &PipelineResult<PipelineOutcome>,
        duration_ms: u64,
    ) -> StepSummary {
        let mut summary = match result {
            Ok(_) => StepSummary::success(build_type, duration_ms),
            Err(e) => StepSummary::failure(build_type, e.category(), e.to_string(), duration_ms),
        };
        if let Some(job) = &self.job {
            summary = summary.with_job_name(job.name());
        }
        if let Some(build) = &self.build {
            summary = summary.with_build(build);
        }
        if let Some(diagnosis) = &self.diagnosis {
            summary = summary.with_errors(diagnosis.errors.as_map().clone());
        }
        summary
    }
}
