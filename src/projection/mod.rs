//! Result projection
//!
//! Maps the primary artifact of a successful build into the pipeline
//! environment and side-report files. One handler per build type:
//! - stage: bill of material, deploy package, staging repository, container
//!   images, `build-type.json`, optional SBOM download
//! - promote: result URLs of successful repositories and the release status
//!
//! Projection never fails the invocation; missing or malformed sections leave
//! the corresponding values empty.

mod environment;
mod filter;
mod images;
mod sbom;

pub use environment::{ContainerEnvironment, PipelineEnvironment, ReleaseStatus, ENVIRONMENT_FILE};
pub use filter::{ArtifactFilter, FilterError};
pub use images::{container_images, image_name_tag, ContainerImages};
pub use sbom::{artifact_names, artifact_urls, download_sboms, HttpSbomFetcher, SbomFetcher, SBOM_DIR, SBOM_REPORT_GLOB};

use serde::{Deserialize, Serialize};
use xmake_protocol::stage::FORMAT_DOCKER;
use xmake_protocol::{BuildResults, PromoteResult, StageResult};

use crate::build::BuildType;
use crate::host::Artifact;
use crate::report::ReportPath;
use crate::workspace::Workspace;

/// Build type marker file of stage builds
pub const BUILD_TYPE_FILE: &str = "build-type.json";

/// Content of `build-type.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTypeMarker {
    #[serde(rename = "build-type")]
    pub build_type: String,
}

impl BuildTypeMarker {
    /// `docker` when any staged repository has docker format, `bin` otherwise
    pub fn for_stage(stage: &StageResult) -> Self {
        let build_type = if stage.repository_with_format(FORMAT_DOCKER).is_some() {
            tracing::info!("staged docker build");
            "docker"
        } else {
            "bin"
        };
        Self {
            build_type: build_type.to_string(),
        }
    }
}

/// Projection inputs besides the artifact
pub struct ProjectionContext<'a> {
    pub workspace: &'a Workspace,
    pub filter: Option<&'a ArtifactFilter>,
    /// Set to download raw-repository SBOM documents
    pub sbom_fetcher: Option<&'a dyn SbomFetcher>,
}

/// Outcome of a projection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub environment: PipelineEnvironment,
    /// Extra entries for the reports manifest
    pub reports: Vec<ReportPath>,
}

fn read_results(artifact: Option<&dyn Artifact>) -> Option<BuildResults> {
    let artifact = match artifact {
        Some(artifact) => artifact,
        None => {
            tracing::warn!("No build result artifact available, pipeline environment stays empty");
            return None;
        }
    };
    let content = match artifact.data() {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Failed to fetch content of '{}': {}", artifact.file_name(), e);
            return None;
        }
    };
    match BuildResults::parse_named(artifact.file_name(), &content) {
        Ok(results) => Some(results),
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    }
}

/// Project the primary artifact for `build_type`
pub fn project(build_type: BuildType, artifact: Option<&dyn Artifact>, context: &ProjectionContext<'_>) -> Projection {
    match build_type {
        BuildType::Stage => project_stage(artifact, context),
        BuildType::Promote => project_promote(artifact, context),
    }
}

/// Stage handler
pub fn project_stage(artifact: Option<&dyn Artifact>, context: &ProjectionContext<'_>) -> Projection {
    let mut stage = read_results(artifact)
        .and_then(|results| match results.stage() {
            Ok(stage) => Some(stage),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        })
        .unwrap_or_default();

    if let Some(filter) = context.filter {
        filter.filter_stage(&mut stage);
    }

    let mut projection = Projection::default();
    let env = &mut projection.environment;
    if !stage.stage_bom.is_empty() {
        env.stage_bom = Some(stage.stage_bom.clone());
    }
    env.xmake_deploy_package = stage.project_archive.clone();
    tracing::debug!("projectArchive: '{:?}'", env.xmake_deploy_package);
    env.staging_repository_id = stage.staging_repo_id.clone();
    tracing::debug!("staging_repo_id: '{:?}'", env.staging_repository_id);

    match container_images(&stage) {
        Some(images) => {
            tracing::debug!("imageNames: '{:?}'", images.names);
            tracing::debug!("imageNameTags: '{:?}'", images.name_tags);
            env.container = ContainerEnvironment {
                image_names: images.names,
                image_name_tags: images.name_tags,
                registry_url: images.credentials.repository_url.clone(),
                repository_username: images.credentials.user.clone(),
                repository_password: images.credentials.password.clone(),
            };
        }
        None => tracing::debug!("no image names and registry credentials exported to the pipeline env: No images found in sbom"),
    }

    if let Some(fetcher) = context.sbom_fetcher {
        let written = download_sboms(&stage, fetcher, context.workspace);
        if !written.is_empty() {
            projection.reports.push(ReportPath::optional(SBOM_REPORT_GLOB));
        }
    }

    let marker = BuildTypeMarker::for_stage(&stage);
    match serde_json::to_vec(&marker) {
        Ok(json) => {
            if let Err(e) = context.workspace.write_file(BUILD_TYPE_FILE, &json) {
                tracing::warn!("failed to write {}: {}", BUILD_TYPE_FILE, e);
            }
        }
        Err(e) => tracing::warn!("failed to encode {}: {}", BUILD_TYPE_FILE, e),
    }
    projection.reports.push(ReportPath::optional(BUILD_TYPE_FILE));

    projection
}

/// Promote handler
pub fn project_promote(artifact: Option<&dyn Artifact>, context: &ProjectionContext<'_>) -> Projection {
    let mut promote: PromoteResult = read_results(artifact)
        .and_then(|results| match results.promote() {
            Ok(promote) => Some(promote),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        })
        .unwrap_or_default();

    if let Some(filter) = context.filter {
        filter.filter_promote(&mut promote);
    }

    let mut projection = Projection::default();
    projection.environment.promoted_artifact_urls = promote.promoted_urls();
    tracing::debug!("promotedArtifactURLs: '{:?}'", projection.environment.promoted_artifact_urls);
    projection.environment.release_status = Some(ReleaseStatus::promoted().to_json());
    projection
}
