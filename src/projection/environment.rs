//! Values handed to later pipeline steps

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use xmake_protocol::StageRepository;

/// File the binary writes the environment to
pub const ENVIRONMENT_FILE: &str = "xmake_pipeline_environment.json";

/// Release status recorded after a promote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseStatus {
    #[serde(rename = "releaseStatus")]
    pub status: String,
}

impl ReleaseStatus {
    pub fn promoted() -> Self {
        Self {
            status: "promoted".to_string(),
        }
    }

    /// Compact JSON form, e.g. `{"releaseStatus":"promoted"}`
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!(r#"{{"releaseStatus":"{}"}}"#, self.status))
    }
}

/// Container values for image push steps
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerEnvironment {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_name_tags: Vec<String>,
    #[serde(rename = "registryURL", default, skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_password: Option<String>,
}

impl fmt::Debug for ContainerEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerEnvironment")
            .field("image_names", &self.image_names)
            .field("image_name_tags", &self.image_name_tags)
            .field("registry_url", &self.registry_url)
            .field("repository_username", &self.repository_username)
            .field("repository_password", &self.repository_password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ContainerEnvironment {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Pipeline environment produced by one invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineEnvironment {
    /// URL of the triggered build
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xmake_job_url: Option<String>,

    #[serde(rename = "stageBOM", default, skip_serializing_if = "Option::is_none")]
    pub stage_bom: Option<BTreeMap<String, StageRepository>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xmake_deploy_package: Option<String>,

    #[serde(rename = "xmakeStagingRepositoryId", default, skip_serializing_if = "Option::is_none")]
    pub staging_repository_id: Option<String>,

    #[serde(rename = "promotedArtifactURLs", default, skip_serializing_if = "Vec::is_empty")]
    pub promoted_artifact_urls: Vec<String>,

    /// `{"releaseStatus":"promoted"}` after a promote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_status: Option<String>,

    #[serde(default, skip_serializing_if = "ContainerEnvironment::is_empty")]
    pub container: ContainerEnvironment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_status_json() {
        assert_eq!(ReleaseStatus::promoted().to_json(), r#"{"releaseStatus":"promoted"}"#);
    }

    #[test]
    fn test_empty_environment_serializes_empty() {
        assert_eq!(serde_json::to_string(&PipelineEnvironment::default()).unwrap(), "{}");
    }

    #[test]
    fn test_field_names() {
        let env = PipelineEnvironment {
            xmake_job_url: Some("https://j/job/a/1/".to_string()),
            staging_repository_id: Some("repo-1".to_string()),
            promoted_artifact_urls: vec!["https://repo/a.tgz".to_string()],
            container: ContainerEnvironment {
                registry_url: Some("repo.example:443".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["xmakeJobUrl"], "https://j/job/a/1/");
        assert_eq!(json["xmakeStagingRepositoryId"], "repo-1");
        assert_eq!(json["promotedArtifactURLs"][0], "https://repo/a.tgz");
        assert_eq!(json["container"]["registryURL"], "repo.example:443");
    }

    #[test]
    fn test_debug_hides_password() {
        let container = ContainerEnvironment {
            repository_password: Some("s3cr3t".to_string()),
            ..Default::default()
        };
        assert!(!format!("{:?}", container).contains("s3cr3t"));
    }
}
