//! xmake lane - remote xmake build orchestration
//!
//! This crate triggers stage and promote builds of xmake jobs on Jenkins,
//! waits for their result and turns the outcome into inputs for later
//! pipeline steps: the pipeline environment, report manifests and, for
//! failed builds, a diagnosis of the failed downstream builds.

pub mod artifact;
pub mod build;
pub mod config;
pub mod diagnosis;
pub mod host;
pub mod job;
pub mod mock;
pub mod pipeline;
pub mod projection;
pub mod report;
pub mod retry;
pub mod summary;
pub mod workspace;

pub use build::{Build, BuildResult, BuildType};
pub use config::{EffectiveConfig, LaneSettings};
pub use pipeline::{Pipeline, PipelineDeps, PipelineError, PipelineOutcome, PipelineRequest};
pub use summary::{ErrorCategory, ExitCode, StepSummary};
