//! xmake Artifact Schemas
//!
//! Typed views of the JSON files an xmake Jenkins build publishes:
//! the primary `build-results.json` (failure links, downstream builds,
//! stage and promote bills of material) and the per-build
//! `error_dictionary.json`.

pub mod build_results;
pub mod error;
pub mod error_dictionary;
pub mod promote;
pub mod stage;

pub use build_results::BuildResults;
pub use error::ProtocolError;
pub use error_dictionary::ErrorDictionary;
pub use promote::{DockerArtifact, PromoteBom, PromoteResult, PromotedRepository};
pub use stage::{Asset, Component, RepositoryCredentials, StageRepository, StageResult};

use serde::{Deserialize, Deserializer};

/// Name of the primary result artifact of every xmake build.
pub const BUILD_RESULTS_FILE: &str = "build-results.json";

/// Name of the structured error artifact of a failed xmake build.
pub const ERROR_DICTIONARY_FILE: &str = "error_dictionary.json";

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
