//! Promote bill of material.

use serde::{Deserialize, Serialize};

use crate::null_as_default;

/// Result of a promote build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromoteResult {
    #[serde(rename = "promote-bom", default, skip_serializing_if = "Option::is_none")]
    pub promote_bom: Option<PromoteBom>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromoteBom {
    #[serde(default, deserialize_with = "null_as_default")]
    pub repositories: Vec<PromotedRepository>,
}

/// Outcome of promoting one repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromotedRepository {
    #[serde(default, deserialize_with = "null_as_default")]
    pub repository: String,

    /// URLs of the released artifacts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub list: Vec<DockerArtifact>,
}

/// A released container image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockerArtifact {
    #[serde(default, deserialize_with = "null_as_default")]
    pub artifact: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
}

impl PromoteResult {
    /// Promoted repositories; empty when the bill of material is missing.
    pub fn repositories(&self) -> &[PromotedRepository] {
        self.promote_bom
            .as_ref()
            .map(|bom| bom.repositories.as_slice())
            .unwrap_or(&[])
    }

    /// Mutable access for filtering.
    pub fn repositories_mut(&mut self) -> &mut [PromotedRepository] {
        match self.promote_bom.as_mut() {
            Some(bom) => bom.repositories.as_mut_slice(),
            None => &mut [],
        }
    }

    /// Result URLs of all successfully promoted repositories, in order.
    pub fn promoted_urls(&self) -> Vec<String> {
        self.repositories()
            .iter()
            .filter(|repo| repo.success)
            .flat_map(|repo| repo.result.iter().cloned())
            .collect()
    }
}
