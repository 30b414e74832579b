//! Build type and job parameters

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const PARAM_MODE: &str = "MODE";
const PARAM_TREEISH: &str = "TREEISH";
const PARAM_STAGING_REPO_ID: &str = "STAGING_REPO_ID";

/// Keys the lane sets itself; user entries with these keys are dropped
pub const RESERVED_KEYS: &[&str] = &[PARAM_MODE, PARAM_TREEISH, PARAM_STAGING_REPO_ID];

/// What the build does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    /// Build and stage a new artifact set
    Stage,
    /// Release a previously staged artifact set
    Promote,
}

impl BuildType {
    /// Value of the `MODE` job parameter
    pub fn mode(&self) -> &'static str {
        match self {
            BuildType::Stage => "stage",
            BuildType::Promote => "promote",
        }
    }

    /// Local file the primary build artifact is saved to
    pub fn report_file_name(&self) -> &'static str {
        match self {
            BuildType::Stage => "xmake_stage.json",
            BuildType::Promote => "xmake_promote.json",
        }
    }

    /// Title of the build link
    pub fn link_title(&self) -> &'static str {
        match self {
            BuildType::Stage => "xmake Jenkins job (stage)",
            BuildType::Promote => "xmake Jenkins job (promote)",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mode())
    }
}

impl FromStr for BuildType {
    type Err = String;

    /// Accepts `stage`/`promote` and the pipeline names `xMakeStage`/`xMakePromote`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stage" | "xMakeStage" => Ok(BuildType::Stage),
            "promote" | "xMakePromote" => Ok(BuildType::Promote),
            other => Err(format!("build type not supported: {}", other)),
        }
    }
}

/// Parameters passed to the job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildParameters(BTreeMap<String, String>);

impl BuildParameters {
    /// Combine free-form `KEY=VALUE` entries with the lane's own parameters.
    ///
    /// Entries without `=`, with an empty key or with a reserved key are
    /// skipped. Keys and values are trimmed; a later entry for the same key
    /// replaces an earlier one.
    pub fn assemble(
        build_type: BuildType,
        commit_id: &str,
        staging_repository_id: &str,
        entries: &[String],
    ) -> Self {
        let mut params = BTreeMap::new();

        for entry in entries {
            let entry = entry.trim();
            let Some((key, value)) = entry.split_once('=') else {
                tracing::error!("Skipping job parameter '{}', could not determine key / value", entry);
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                tracing::error!("Skipping job parameter '{}', empty key", entry);
                continue;
            }
            if RESERVED_KEYS.contains(&key) {
                tracing::error!("Skipping job parameter '{}', not allowed", entry);
                continue;
            }
            params.insert(key.to_string(), value.trim().to_string());
        }

        params.insert(PARAM_MODE.to_string(), build_type.mode().to_string());
        params.insert(PARAM_TREEISH.to_string(), commit_id.to_string());
        if build_type == BuildType::Promote {
            params.insert(PARAM_STAGING_REPO_ID.to_string(), staging_repository_id.to_string());
        }

        for (key, value) in &params {
            tracing::info!("Using job parameter '{}' with value '{}'", key, value);
        }

        Self(params)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
