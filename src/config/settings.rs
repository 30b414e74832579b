//! Typed view of the effective configuration

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use xmake_rules::RuleSet;

use super::defaults::BuiltinDefaults;
use super::effective::{ConfigError, EffectiveConfig};
use crate::build::WaitConfig;
use crate::diagnosis::{DiagnosisConfig, DiscoveryStrategy};
use crate::retry::RetryPolicy;

/// Settings of one lane invocation
#[derive(Debug, Clone, PartialEq)]
pub struct LaneSettings {
    pub job_finder_url: String,
    pub http_timeout: Duration,
    pub connect: RetryPolicy,
    pub wait: WaitConfig,
    /// Primary artifact name on the build
    pub artifact_name: String,
    pub artifact_fetch: RetryPolicy,
    pub diagnosis: DiagnosisConfig,
    /// Custom rules replacing the embedded ones
    pub rules_file: Option<PathBuf>,
    pub step_name: String,
    /// Empty disables filtering
    pub artifact_pattern: String,
    pub sbom_download: bool,
}

impl Default for LaneSettings {
    fn default() -> Self {
        Self::from_defaults(&BuiltinDefaults::default())
    }
}

impl LaneSettings {
    fn from_defaults(d: &BuiltinDefaults) -> Self {
        Self {
            job_finder_url: d.job_finder_url.clone(),
            http_timeout: Duration::from_secs(d.http_timeout_seconds),
            connect: RetryPolicy::new(d.connect_attempts, Duration::from_millis(d.connect_delay_ms)),
            wait: WaitConfig {
                poll_interval: Duration::from_millis(d.poll_interval_ms),
                max_retries: d.poll_max_retries,
            },
            artifact_name: d.artifact_name.clone(),
            artifact_fetch: RetryPolicy::new(d.artifact_attempts, Duration::from_millis(d.artifact_delay_ms)),
            diagnosis: DiagnosisConfig {
                strategy: d.diagnosis_strategy,
                max_depth: d.diagnosis_max_depth,
                error_dictionary: d.error_dictionary.clone(),
                build_results: d.artifact_name.clone(),
            },
            rules_file: None,
            step_name: d.step_name.clone(),
            artifact_pattern: d.artifact_pattern.clone(),
            sbom_download: d.sbom_download,
        }
    }

    /// Read the settings out of a validated effective config.
    ///
    /// Keys absent from the config keep their built-in value.
    pub fn from_config(config: &EffectiveConfig) -> Result<Self, ConfigError> {
        let defaults = BuiltinDefaults::default();
        let u64_or = |path: &str, default: u64| config.get_u64(path).unwrap_or(default);
        let u32_or = |path: &str, default: u32| {
            config
                .get_u64(path)
                .map(|n| u32::try_from(n).map_err(|_| ConfigError::ValidationError(format!("{} is too large", path))))
                .transpose()
                .map(|n| n.unwrap_or(default))
        };
        let string_or = |path: &str, default: &str| config.get_str(path).unwrap_or(default).to_string();

        let strategy = match config.get_str("diagnosis.strategy") {
            Some(s) => s.parse::<DiscoveryStrategy>().map_err(ConfigError::ValidationError)?,
            None => defaults.diagnosis_strategy,
        };
        let artifact_name = string_or("artifact.name", &defaults.artifact_name);
        let rules_file = config
            .get_str("diagnosis.rules_file")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            job_finder_url: string_or("job_finder.url", &defaults.job_finder_url),
            http_timeout: Duration::from_secs(u64_or("http.timeout_seconds", defaults.http_timeout_seconds)),
            connect: RetryPolicy::new(
                u32_or("connect.attempts", defaults.connect_attempts)?,
                Duration::from_millis(u64_or("connect.delay_ms", defaults.connect_delay_ms)),
            ),
            wait: WaitConfig {
                poll_interval: Duration::from_millis(u64_or("poll.interval_ms", defaults.poll_interval_ms)),
                max_retries: u32_or("poll.max_retries", defaults.poll_max_retries)?,
            },
            artifact_fetch: RetryPolicy::new(
                u32_or("artifact.attempts", defaults.artifact_attempts)?,
                Duration::from_millis(u64_or("artifact.delay_ms", defaults.artifact_delay_ms)),
            ),
            diagnosis: DiagnosisConfig {
                strategy,
                max_depth: u32_or("diagnosis.max_depth", defaults.diagnosis_max_depth)?,
                error_dictionary: string_or("diagnosis.error_dictionary", &defaults.error_dictionary),
                build_results: artifact_name.clone(),
            },
            artifact_name,
            rules_file,
            step_name: string_or("reports.step_name", &defaults.step_name),
            artifact_pattern: string_or("artifact.pattern", &defaults.artifact_pattern),
            sbom_download: config.get_bool("sbom.download").unwrap_or(defaults.sbom_download),
        })
    }

    /// The custom rules file if configured, the embedded rules otherwise
    pub fn load_rules(&self) -> Result<RuleSet, ConfigError> {
        let Some(path) = &self.rules_file else {
            return Ok(RuleSet::builtin());
        };
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
        let rules = RuleSet::from_json(&json)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        tracing::info!("loaded {} error rules from {}", rules.len(), path.display());
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_settings() {
        let settings = LaneSettings::from_config(&EffectiveConfig::build(None, None, None).unwrap()).unwrap();

        assert_eq!(settings, LaneSettings::default());
        assert_eq!(settings.connect.max_attempts, 5);
        assert_eq!(settings.wait.poll_interval, Duration::from_secs(15));
        assert_eq!(settings.wait.max_retries, 4);
        assert_eq!(settings.artifact_fetch.delay, Duration::from_secs(3));
        assert_eq!(settings.diagnosis.build_results, "build-results.json");
        assert!(settings.rules_file.is_none());
    }

    #[test]
    fn test_overrides_applied() {
        let cli = json!({
            "poll": {"interval_ms": 0},
            "artifact": {"name": "results.json", "pattern": "*.tgz"},
            "diagnosis": {"strategy": "downstreams", "max_depth": 3, "rules_file": "rules.json"},
            "sbom": {"download": false}
        });
        let config = EffectiveConfig::build(None, None, Some(cli)).unwrap();
        let settings = LaneSettings::from_config(&config).unwrap();

        assert_eq!(settings.wait.poll_interval, Duration::ZERO);
        assert_eq!(settings.artifact_name, "results.json");
        assert_eq!(settings.diagnosis.build_results, "results.json");
        assert_eq!(settings.diagnosis.strategy, DiscoveryStrategy::Downstreams);
        assert_eq!(settings.diagnosis.max_depth, 3);
        assert_eq!(settings.rules_file, Some(PathBuf::from("rules.json")));
        assert_eq!(settings.artifact_pattern, "*.tgz");
        assert!(!settings.sbom_download);
    }

    #[test]
    fn test_load_custom_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        fs::write(&path, r#"{"CUSTOM-001: broken": ["^broken$"]}"#).unwrap();
        let settings = LaneSettings {
            rules_file: Some(path),
            ..LaneSettings::default()
        };

        let rules = settings.load_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.find("ok\nbroken\n"), Some("CUSTOM-001: broken"));
    }

    #[test]
    fn test_missing_rules_file() {
        let settings = LaneSettings {
            rules_file: Some(PathBuf::from("/nonexistent/rules.json")),
            ..LaneSettings::default()
        };
        assert!(matches!(settings.load_rules(), Err(ConfigError::IoError(_))));
    }
}
