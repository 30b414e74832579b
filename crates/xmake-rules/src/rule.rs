//! A single error rule.

use regex_lite::Regex;

use crate::error::RuleError;

/// Named set of patterns. The name is the message reported to the user.
#[derive(Debug, Clone)]
pub struct ErrorRule {
    name: String,
    patterns: Vec<Regex>,
}

impl ErrorRule {
    /// Compile a rule; any invalid pattern is an error.
    pub fn new<S: AsRef<str>>(name: impl Into<String>, patterns: &[S]) -> Result<Self, RuleError> {
        let name = name.into();
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let regex = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
                rule: name.clone(),
                pattern: pattern.to_string(),
                source,
            })?;
            compiled.push(regex);
        }
        if compiled.is_empty() {
            return Err(RuleError::NoPatterns(name));
        }
        Ok(Self {
            name,
            patterns: compiled,
        })
    }

    /// Compile a rule, dropping invalid patterns with a warning.
    ///
    /// Returns `None` when no pattern survives.
    pub fn lenient<S: AsRef<str>>(name: impl Into<String>, patterns: &[S]) -> Option<Self> {
        let name = name.into();
        let compiled: Vec<Regex> = patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern.as_ref()) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::warn!(rule = %name, pattern = pattern.as_ref(), "invalid regex: {}", e);
                    None
                }
            })
            .collect();

        if compiled.is_empty() {
            tracing::warn!(rule = %name, "error rule has no usable pattern, skipping");
            return None;
        }
        Some(Self {
            name,
            patterns: compiled,
        })
    }

    /// The rule name, reported verbatim as the failure message.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source text of the compiled patterns.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }

    /// Whether any pattern matches somewhere in the line.
    pub fn matches(&self, line: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_substring() {
        let rule = ErrorRule::new("USR-0: boom", &[r"Result was FAILURE"]).unwrap();
        assert!(rule.matches("Job #3 completed. Result was FAILURE"));
        assert!(!rule.matches("Result was SUCCESS"));
    }

    #[test]
    fn test_strict_rejects_invalid_pattern() {
        let err = ErrorRule::new("bad", &["(unclosed"]).unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));

        let err = ErrorRule::new("empty", &[] as &[&str]).unwrap_err();
        assert!(matches!(err, RuleError::NoPatterns(_)));
    }

    #[test]
    fn test_lenient_drops_invalid_pattern() {
        let rule = ErrorRule::lenient("mixed", &["(unclosed", "ok"]).unwrap();
        assert_eq!(rule.patterns().collect::<Vec<_>>(), vec!["ok"]);

        assert!(ErrorRule::lenient("all-bad", &["(", "["]).is_none());
    }
}
