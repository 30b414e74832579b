//! Step summary and failure taxonomy
//!
//! Every stage/promote invocation ends in one `StepSummary` whose exit code
//! is derived from the `ErrorCategory` of the error that ended it.

mod failure;
mod step_summary;

pub use failure::{ErrorCategory, ExitCode, Status};
pub use step_summary::{summary_file_name, StepSummary, SUMMARY_SCHEMA_ID, SUMMARY_SCHEMA_VERSION};
