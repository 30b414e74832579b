//! The primary result artifact of an xmake build.
//!
//! `build-results.json` is one JSON object that carries several independent
//! sections. Each section is decoded on demand so that a malformed section
//! does not hide the others.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ProtocolError;
use crate::promote::PromoteResult;
use crate::stage::StageResult;
use crate::BUILD_RESULTS_FILE;

/// Console links of failed downstream builds.
const JOB_FAILURE: &str = "JOB_FAILURE";

/// Downstream job name to build URL.
const DOWNSTREAMS: &str = "DOWNSTREAMS";

/// Parsed `build-results.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildResults {
    file: String,
    document: Map<String, Value>,
}

impl BuildResults {
    /// Parse the artifact content.
    pub fn parse(content: &[u8]) -> Result<Self, ProtocolError> {
        Self::parse_named(BUILD_RESULTS_FILE, content)
    }

    /// Parse artifact content that was published under another name.
    pub fn parse_named(file: &str, content: &[u8]) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_slice(content).map_err(|source| {
            ProtocolError::Unmarshal {
                file: file.to_string(),
                source,
            }
        })?;

        match value {
            Value::Object(document) => Ok(Self {
                file: file.to_string(),
                document,
            }),
            _ => Err(ProtocolError::NotAnObject {
                file: file.to_string(),
            }),
        }
    }

    /// Console URLs of the failed downstream builds, in artifact order.
    ///
    /// A missing or `null` section yields an empty list.
    pub fn job_failure(&self) -> Result<Vec<String>, ProtocolError> {
        self.section(JOB_FAILURE)
    }

    /// Downstream builds keyed by job name.
    pub fn downstreams(&self) -> Result<BTreeMap<String, String>, ProtocolError> {
        self.section(DOWNSTREAMS)
    }

    /// Decode the stage bill of material.
    pub fn stage(&self) -> Result<StageResult, ProtocolError> {
        self.whole()
    }

    /// Decode the promote bill of material.
    pub fn promote(&self) -> Result<PromoteResult, ProtocolError> {
        self.whole()
    }

    /// The raw JSON document.
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    fn whole<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(Value::Object(self.document.clone())).map_err(|source| {
            ProtocolError::Unmarshal {
                file: self.file.clone(),
                source,
            }
        })
    }

    /// Look up a top-level key ignoring ASCII case. An exact match wins.
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.document.get(key).or_else(|| {
            self.document
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }

    fn section<T: DeserializeOwned + Default>(
        &self,
        field: &'static str,
    ) -> Result<T, ProtocolError> {
        match self.lookup(field) {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|source| ProtocolError::InvalidField {
                    file: self.file.clone(),
                    field,
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_failure_in_order() {
        let results = BuildResults::parse(
            br#"{"JOB_FAILURE": ["https://x/job/a/job/b/2/consoleFull", "https://x/job/a/job/c/9/consoleFull"]}"#,
        )
        .unwrap();

        let links = results.job_failure().unwrap();
        assert_eq!(links.len(), 2);
        assert!(links[0].contains("/job/b/2/"));
        assert!(links[1].contains("/job/c/9/"));
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let results = BuildResults::parse(b"{}").unwrap();
        assert!(results.job_failure().unwrap().is_empty());
        assert!(results.downstreams().unwrap().is_empty());

        let results = BuildResults::parse(br#"{"JOB_FAILURE": null}"#).unwrap();
        assert!(results.job_failure().unwrap().is_empty());
    }

    #[test]
    fn test_downstreams_key_ignores_case() {
        let results = BuildResults::parse(
            br#"{"downstreams": {"job-a": "https://x/job/f/job/job-a/3/"}}"#,
        )
        .unwrap();

        let downstreams = results.downstreams().unwrap();
        assert_eq!(
            downstreams.get("job-a").map(String::as_str),
            Some("https://x/job/f/job/job-a/3/")
        );
    }

    #[test]
    fn test_malformed_section_does_not_hide_others() {
        let results = BuildResults::parse(
            br#"{"JOB_FAILURE": 42, "DOWNSTREAMS": {"a": "https://x/job/f/job/a/1/"}}"#,
        )
        .unwrap();

        let err = results.job_failure().unwrap_err();
        assert!(err.to_string().contains("JOB_FAILURE"));
        assert_eq!(results.downstreams().unwrap().len(), 1);
    }

    #[test]
    fn test_non_object_rejected() {
        let err = BuildResults::parse(b"[1, 2]").unwrap_err();
        assert!(matches!(err, ProtocolError::NotAnObject { .. }));

        let err = BuildResults::parse(b"not json").unwrap_err();
        assert_eq!(err.file(), "build-results.json");
    }
}
