//! Built-in configuration defaults

use serde_json::{json, Value};
use xmake_protocol::{BUILD_RESULTS_FILE, ERROR_DICTIONARY_FILE};

use crate::artifact::{DEFAULT_FETCH_ATTEMPTS, DEFAULT_FETCH_DELAY};
use crate::diagnosis::DiscoveryStrategy;
use crate::job::DEFAULT_SERVICE_URL;
use crate::report::DEFAULT_STEP_NAME;

/// Built-in default configuration values
#[derive(Debug, Clone)]
pub struct BuiltinDefaults {
    pub job_finder_url: String,
    pub http_timeout_seconds: u64,
    pub connect_attempts: u32,
    pub connect_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_max_retries: u32,
    pub artifact_name: String,
    pub artifact_attempts: u32,
    pub artifact_delay_ms: u64,
    pub diagnosis_strategy: DiscoveryStrategy,
    pub diagnosis_max_depth: u32,
    pub error_dictionary: String,
    /// Empty means the embedded rule set
    pub rules_file: String,
    pub step_name: String,
    /// Empty means no filtering
    pub artifact_pattern: String,
    pub sbom_download: bool,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            job_finder_url: DEFAULT_SERVICE_URL.to_string(),
            http_timeout_seconds: 60,
            connect_attempts: 5,
            connect_delay_ms: 3_000,
            poll_interval_ms: 15_000,
            poll_max_retries: 4,
            artifact_name: BUILD_RESULTS_FILE.to_string(),
            artifact_attempts: DEFAULT_FETCH_ATTEMPTS,
            artifact_delay_ms: DEFAULT_FETCH_DELAY.as_millis() as u64,
            diagnosis_strategy: DiscoveryStrategy::JobFailure,
            diagnosis_max_depth: 1,
            error_dictionary: ERROR_DICTIONARY_FILE.to_string(),
            rules_file: String::new(),
            step_name: DEFAULT_STEP_NAME.to_string(),
            artifact_pattern: String::new(),
            sbom_download: true,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to a JSON Value for merging
    pub fn to_value(&self) -> Value {
        json!({
            "job_finder": {
                "url": self.job_finder_url
            },
            "http": {
                "timeout_seconds": self.http_timeout_seconds
            },
            "connect": {
                "attempts": self.connect_attempts,
                "delay_ms": self.connect_delay_ms
            },
            "poll": {
                "interval_ms": self.poll_interval_ms,
                "max_retries": self.poll_max_retries
            },
            "artifact": {
                "name": self.artifact_name,
                "attempts": self.artifact_attempts,
                "delay_ms": self.artifact_delay_ms,
                "pattern": self.artifact_pattern
            },
            "diagnosis": {
                "strategy": self.diagnosis_strategy.as_str(),
                "max_depth": self.diagnosis_max_depth,
                "error_dictionary": self.error_dictionary,
                "rules_file": self.rules_file
            },
            "reports": {
                "step_name": self.step_name
            },
            "sbom": {
                "download": self.sbom_download
            }
        })
    }
}
