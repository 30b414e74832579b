//! Mock orchestrator and services
//!
//! In-process stand-ins for Jenkins, the job finder and the SBOM download
//! service. Used by unit tests, the integration tests and local dry runs.
//!
//! # Operations
//!
//! - `connect`: open a session, counted and failable
//! - `trigger`: start a scheduled or freshly numbered build
//! - `poll`: answer from a per-build script; the last answer repeats
//! - `fetch_artifact` / `console_output`: serve registered content
//! - `locate_build`: find a downstream build by job path and number

mod failure;
mod finder;
mod orchestrator;
mod state;

pub use failure::{FailureConfig, FailureInjector, Operation};
pub use finder::{StaticJobFinder, StaticSbomFetcher};
pub use orchestrator::{MockOrchestrator, MockSession};
pub use state::{build_key, BuildKey, MockBuild, MockState};
