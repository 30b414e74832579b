//! Bounded-retry retrieval of build artifacts

use std::time::Duration;

use crate::build::Build;
use crate::host::{Artifact, Session, StaticArtifact, TransportError};
use crate::retry::RetryPolicy;
use crate::workspace::Workspace;

/// Default number of fetch attempts
pub const DEFAULT_FETCH_ATTEMPTS: u32 = 5;

/// Default pause between two fetch attempts
pub const DEFAULT_FETCH_DELAY: Duration = Duration::from_secs(3);

/// Fetches artifacts that may not be published yet when the build finished
#[derive(Debug, Clone)]
pub struct ArtifactRetriever {
    policy: RetryPolicy,
}

impl Default for ArtifactRetriever {
    fn default() -> Self {
        Self::new(RetryPolicy::new(DEFAULT_FETCH_ATTEMPTS, DEFAULT_FETCH_DELAY))
    }
}

impl ArtifactRetriever {
    /// Create a new retriever
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch `remote_name` from `build` and save it as `local_name`.
    ///
    /// Returns `None` once every attempt failed. A failed save is logged and
    /// the artifact is still returned.
    pub fn fetch(
        &self,
        session: &dyn Session,
        build: &Build,
        remote_name: &str,
        local_name: &str,
        workspace: &Workspace,
    ) -> Option<Box<dyn Artifact>> {
        let outcome = self.policy.run_observed(
            |attempt| {
                tracing::debug!("(Try {}) Fetching artifact '{}' of build {}", attempt, remote_name, build.url);
                let artifact = session.fetch_artifact(build, remote_name)?;
                let content = artifact.data()?;
                Ok::<_, TransportError>(StaticArtifact::new(artifact.file_name(), content))
            },
            |attempt, err| {
                tracing::warn!("(Try {}) Failed to fetch artifact '{}': {}", attempt, remote_name, err);
            },
        );

        let done = match outcome {
            Ok(done) => done,
            Err(exhausted) => {
                tracing::error!(
                    "Unable to fetch artifact '{}' after {} tries: {}",
                    remote_name,
                    exhausted.attempts,
                    exhausted.last_error
                );
                return None;
            }
        };

        let artifact = done.value;
        match artifact.data() {
            Ok(content) => match workspace.write_file(local_name, &content) {
                Ok(path) => tracing::info!("Saved artifact '{}' to {}", remote_name, path.display()),
                Err(e) => tracing::warn!("Failed to save artifact '{}' as '{}': {}", remote_name, local_name, e),
            },
            Err(e) => tracing::warn!("Failed to read artifact '{}': {}", remote_name, e),
        }

        Some(Box::new(artifact))
    }
}
