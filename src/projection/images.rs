//! Container images of a stage build

use xmake_protocol::stage::FORMAT_DOCKER;
use xmake_protocol::{RepositoryCredentials, StageResult};

/// Images staged into the first docker repository
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerImages {
    /// Distinct component artifacts, in component order
    pub names: Vec<String>,
    /// `name:tag` of every component image, registry host removed
    pub name_tags: Vec<String>,
    pub credentials: RepositoryCredentials,
}

/// `name:tag` of a fully qualified image reference.
///
/// The first path segment is treated as registry host when it contains a
/// `.` or `:` or is `localhost`. A reference without tag or digest gets
/// `:latest`.
pub fn image_name_tag(image: &str) -> Option<String> {
    let image = image.trim();
    if image.is_empty() {
        return None;
    }

    let remainder = match image.split_once('/') {
        Some((first, rest)) if first.contains('.') || first.contains(':') || first == "localhost" => rest,
        _ => image,
    };
    if remainder.is_empty() {
        return None;
    }

    let last_segment = remainder.rsplit('/').next().unwrap_or(remainder);
    if last_segment.contains(':') || last_segment.contains('@') {
        Some(remainder.to_string())
    } else {
        Some(format!("{}:latest", remainder))
    }
}

/// Images of the first docker repository of `stage`.
///
/// Returns `None` when no image names were found.
pub fn container_images(stage: &StageResult) -> Option<ContainerImages> {
    let repository = stage.repository_with_format(FORMAT_DOCKER)?;

    let mut images = ContainerImages {
        credentials: repository.credentials.clone().unwrap_or_default(),
        ..Default::default()
    };
    for component in &repository.components {
        // multi-arch builds repeat the artifact with distinct images
        if let Some(artifact) = component.artifact.as_deref().filter(|a| !a.is_empty()) {
            if !images.names.iter().any(|n| n == artifact) {
                images.names.push(artifact.to_string());
            }
        }
        if let Some(name_tag) = component.image.as_deref().and_then(image_name_tag) {
            images.name_tags.push(name_tag);
        }
    }

    if images.names.is_empty() {
        None
    } else {
        Some(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_name_tag_strips_registry() {
        assert_eq!(
            image_name_tag("repo.example:443/com.example/ppiper:1.0").as_deref(),
            Some("com.example/ppiper:1.0")
        );
        assert_eq!(image_name_tag("localhost/app").as_deref(), Some("app:latest"));
    }

    #[test]
    fn test_image_name_tag_without_registry() {
        assert_eq!(image_name_tag("team/app:2").as_deref(), Some("team/app:2"));
        assert_eq!(image_name_tag("app").as_deref(), Some("app:latest"));
        assert_eq!(image_name_tag("app@sha256:abc").as_deref(), Some("app@sha256:abc"));
        assert_eq!(image_name_tag(""), None);
    }

    #[test]
    fn test_container_images_dedup_names() {
        let stage: StageResult = serde_json::from_str(
            r#"{"stage-bom":{"docker":{"format":"docker",
                "credentials":{"password":"pw","repository":"r1","repositoryURL":"repo.example:443","user":"u"},
                "components":[
                    {"artifact":"ppiper","image":"repo.example:443/ppiper:1.0-amd64"},
                    {"artifact":"ppiper","image":"repo.example:443/ppiper:1.0-arm64"}
                ]}}}"#,
        )
        .unwrap();

        let images = container_images(&stage).unwrap();
        assert_eq!(images.names, vec!["ppiper".to_string()]);
        assert_eq!(images.name_tags, vec!["ppiper:1.0-amd64".to_string(), "ppiper:1.0-arm64".to_string()]);
        assert_eq!(images.credentials.user.as_deref(), Some("u"));
        assert_eq!(images.credentials.repository_url.as_deref(), Some("repo.example:443"));
    }

    #[test]
    fn test_no_docker_repository() {
        let stage: StageResult = serde_json::from_str(r#"{"stage-bom":{"maven":{"format":"maven"}}}"#).unwrap();
        assert!(container_images(&stage).is_none());
    }
}
