//! Stage bill of material.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::null_as_default;

/// Repository format carrying container images.
pub const FORMAT_DOCKER: &str = "docker";

/// Repository format carrying plain files (bills of material among them).
pub const FORMAT_RAW: &str = "raw";

/// Result of a stage build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Staged repositories keyed by repository type (`docker`, `maven`, ...).
    #[serde(
        rename = "stage-bom",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub stage_bom: BTreeMap<String, StageRepository>,

    /// Deploy package of the staged project.
    #[serde(rename = "projectArchive", default, skip_serializing_if = "Option::is_none")]
    pub project_archive: Option<String>,

    /// Identifier of the staging repository, needed by a later promote.
    #[serde(rename = "staging_repo_id", default, skip_serializing_if = "Option::is_none")]
    pub staging_repo_id: Option<String>,
}

/// One staged repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageRepository {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<RepositoryCredentials>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl StageRepository {
    /// Check the repository format.
    pub fn has_format(&self, format: &str) -> bool {
        self.format.as_deref() == Some(format)
    }
}

/// A staged component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<Asset>,

    /// Fully qualified image reference, registry host included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A single staged file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,

    #[serde(rename = "fileName", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    #[serde(rename = "relativePath", default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Access data of a staging repository.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(rename = "repositoryURL", default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl fmt::Debug for RepositoryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryCredentials")
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("repository", &self.repository)
            .field("repository_url", &self.repository_url)
            .field("user", &self.user)
            .finish()
    }
}

impl StageResult {
    /// First repository of the given format, in key order.
    pub fn repository_with_format(&self, format: &str) -> Option<&StageRepository> {
        self.stage_bom.values().find(|repo| repo.has_format(format))
    }

    /// All repositories of the given format, in key order.
    pub fn repositories_with_format<'a>(
        &'a self,
        format: &'a str,
    ) -> impl Iterator<Item = &'a StageRepository> + 'a {
        self.stage_bom.values().filter(move |repo| repo.has_format(format))
    }
}
