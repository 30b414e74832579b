//! Artifact glob filtering

use globset::{Glob, GlobMatcher};
use xmake_protocol::{PromoteResult, StageResult};

/// Invalid artifact pattern
#[derive(Debug, thiserror::Error)]
#[error("invalid artifact pattern '{pattern}': {source}")]
pub struct FilterError {
    pub pattern: String,
    #[source]
    pub source: globset::Error,
}

/// Keeps artifacts whose file name matches a glob
#[derive(Debug, Clone)]
pub struct ArtifactFilter {
    pattern: String,
    matcher: GlobMatcher,
}

impl ArtifactFilter {
    /// Compile `pattern`; an empty pattern means no filtering
    pub fn new(pattern: &str) -> Result<Option<Self>, FilterError> {
        if pattern.is_empty() {
            return Ok(None);
        }
        let glob = Glob::new(pattern).map_err(|source| FilterError {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Some(Self {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        }))
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, file_name: &str) -> bool {
        self.matcher.is_match(file_name)
    }

    /// Drop staged assets whose file name does not match
    pub fn filter_stage(&self, stage: &mut StageResult) {
        tracing::debug!("filtering staged artifacts with pattern {}", self.pattern);
        for repository in stage.stage_bom.values_mut() {
            for component in &mut repository.components {
                component.assets.retain(|asset| {
                    let keep = asset.file_name.as_deref().is_some_and(|name| self.is_match(name));
                    let url = asset.url.as_deref().unwrap_or_default();
                    if keep {
                        tracing::debug!("keeping {}", url);
                    } else {
                        tracing::debug!("ignoring {}", url);
                    }
                    keep
                });
            }
        }
    }

    /// Drop promoted result URLs whose base name does not match
    pub fn filter_promote(&self, promote: &mut PromoteResult) {
        tracing::debug!("filtering promoted artifacts with pattern {}", self.pattern);
        for repository in promote.repositories_mut() {
            repository.result.retain(|url| {
                let base_name = url.rsplit('/').next().unwrap_or(url);
                let keep = self.is_match(base_name);
                if keep {
                    tracing::debug!("keeping {}", url);
                } else {
                    tracing::debug!("ignoring {}", url);
                }
                keep
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pattern_disables_filtering() {
        assert!(ArtifactFilter::new("").unwrap().is_none());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ArtifactFilter::new("[").unwrap_err();
        assert!(err.to_string().starts_with("invalid artifact pattern '['"));
    }

    #[test]
    fn test_filter_stage_assets() {
        let mut stage: StageResult = serde_json::from_str(
            r#"{"stage-bom":{"maven":{"format":"maven","components":[{"artifact":"app","assets":[
                {"fileName":"app-1.0.jar","url":"https://repo/app-1.0.jar"},
                {"fileName":"app-1.0.pom","url":"https://repo/app-1.0.pom"},
                {"url":"https://repo/unnamed"}
            ]}]}}}"#,
        )
        .unwrap();

        ArtifactFilter::new("*.jar").unwrap().unwrap().filter_stage(&mut stage);

        let assets = &stage.stage_bom["maven"].components[0].assets;
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].file_name.as_deref(), Some("app-1.0.jar"));
    }

    #[test]
    fn test_filter_promote_results_by_base_name() {
        let mut promote: PromoteResult = serde_json::from_str(
            r#"{"promote-bom":{"repositories":[{"repository":"r","success":true,"result":[
                "https://repo/com/example/app/1.0/app-1.0.tgz",
                "https://repo/com/example/app/1.0/app-1.0.pom"
            ]}]}}"#,
        )
        .unwrap();

        ArtifactFilter::new("*.tgz").unwrap().unwrap().filter_promote(&mut promote);
        assert_eq!(
            promote.promoted_urls(),
            vec!["https://repo/com/example/app/1.0/app-1.0.tgz".to_string()]
        );
    }
}
