//! Reports and links manifests
//!
//! The calling pipeline archives the files listed in `<step>_reports.json`
//! and shows the entries of `<step>_links.json` on the build page.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;

use crate::workspace::Workspace;

/// Default step name used for manifest file names
pub const DEFAULT_STEP_NAME: &str = "xmakeExecuteBuild";

/// One manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPath {
    /// Display name (links only)
    #[serde(default)]
    pub name: String,
    /// File glob (reports) or URL (links)
    pub target: String,
    /// Whether a missing file fails archiving
    #[serde(default)]
    pub mandatory: bool,
}

impl ReportPath {
    /// A report file that must exist
    pub fn mandatory(target: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            target: target.into(),
            mandatory: true,
        }
    }

    /// A report file that may be missing
    pub fn optional(target: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            target: target.into(),
            mandatory: false,
        }
    }

    /// A named link
    pub fn link(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            mandatory: false,
        }
    }
}

/// File names of the two manifests for a step
pub fn manifest_names(step_name: &str) -> (String, String) {
    (
        format!("{}_reports.json", step_name),
        format!("{}_links.json", step_name),
    )
}

/// Write both manifests (compact JSON arrays) to the workspace.
///
/// Existing manifests of the same step are replaced.
pub fn persist_reports_and_links(
    workspace: &Workspace,
    step_name: &str,
    reports: &[ReportPath],
    links: &[ReportPath],
) -> io::Result<(PathBuf, PathBuf)> {
    let (reports_name, links_name) = manifest_names(step_name);

    let reports_json = serde_json::to_vec(reports)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let links_json = serde_json::to_vec(links)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let reports_path = workspace.write_file(&reports_name, &reports_json)?;
    let links_path = workspace.write_file(&links_name, &links_json)?;

    tracing::debug!(reports = reports.len(), links = links.len(), "persisted reports and links for {}", step_name);
    Ok((reports_path, links_path))
}
