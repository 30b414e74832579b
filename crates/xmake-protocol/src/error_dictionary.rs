//! Structured failure data of a single xmake build.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::ERROR_DICTIONARY_FILE;

/// Parsed `error_dictionary.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDictionary {
    /// Error code followed by message fragments.
    #[serde(
        rename = "BUILDRESULTS",
        alias = "buildresults",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub build_results: Option<Vec<String>>,
}

impl ErrorDictionary {
    /// Parse the artifact content.
    pub fn parse(content: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(content).map_err(|source| ProtocolError::Unmarshal {
            file: ERROR_DICTIONARY_FILE.to_string(),
            source,
        })
    }

    /// The failure message: all `BUILDRESULTS` entries joined with `:`.
    ///
    /// Returns `None` when the dictionary has no `BUILDRESULTS` entry.
    pub fn message(&self) -> Option<String> {
        self.build_results.as_ref().map(|parts| parts.join(":"))
    }
}
