//! Ordered rule set and console scanning.

use std::collections::BTreeMap;

use crate::error::RuleError;
use crate::rule::ErrorRule;
use crate::BUILTIN_RULES_JSON;

/// Where a rule matched in a console log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch<'r, 'c> {
    /// Name of the matching rule.
    pub rule: &'r str,
    /// 1-based line number in the console log.
    pub line_number: usize,
    /// The matching line.
    pub line: &'c str,
}

/// Error rules, evaluated in ascending name order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<ErrorRule>,
}

impl RuleSet {
    /// An empty rule set; never matches.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The rules shipped with the lane.
    pub fn builtin() -> Self {
        match Self::from_json(BUILTIN_RULES_JSON) {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!("Failed to load built-in error rules: {}", e);
                Self::empty()
            }
        }
    }

    /// Parse a JSON object of rule name to pattern list.
    ///
    /// Malformed JSON is an error; invalid patterns are dropped with a warning.
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let map: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        Ok(Self::from_map(map))
    }

    /// Build from an already parsed map.
    pub fn from_map(map: BTreeMap<String, Vec<String>>) -> Self {
        let rules = map
            .into_iter()
            .filter_map(|(name, patterns)| ErrorRule::lenient(name, &patterns))
            .collect();
        Self { rules }
    }

    /// Build from compiled rules; order is normalised by name.
    pub fn from_rules(mut rules: Vec<ErrorRule>) -> Self {
        rules.sort_by(|a, b| a.name().cmp(b.name()));
        rules.dedup_by(|a, b| a.name() == b.name());
        Self { rules }
    }

    pub fn rules(&self) -> &[ErrorRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule matching a single line. Rules are tried in name order.
    pub fn match_line(&self, line: &str) -> Option<&ErrorRule> {
        self.rules.iter().find(|rule| rule.matches(line))
    }

    /// Scan a console log line by line; the earliest matching line decides.
    pub fn scan<'c>(&self, console: &'c str) -> Option<RuleMatch<'_, 'c>> {
        tracing::debug!(rules = self.rules.len(), "scanning console log for error rules");
        for (index, line) in console.lines().enumerate() {
            if let Some(rule) = self.match_line(line) {
                tracing::debug!("Found error '{}' in line {}: '{}'", rule.name(), index + 1, line);
                return Some(RuleMatch {
                    rule: rule.name(),
                    line_number: index + 1,
                    line,
                });
            }
        }
        tracing::debug!("Found no error rule in console log");
        None
    }

    /// Message of the first matching rule, if any.
    pub fn find(&self, console: &str) -> Option<&str> {
        self.scan(console).map(|m| m.rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOWNSTREAM_RULE: &str =
        "USR-JJEN-000: Please check the xmake downstream build log for details";

    #[test]
    fn test_builtin_downstream_rule() {
        let rules = RuleSet::builtin();
        assert!(!rules.is_empty());

        assert_eq!(rules.find("Job completed. Result was FAILURE"), Some(DOWNSTREAM_RULE));
        assert_eq!(rules.find("Job #222 completed. Result was FAILURE"), Some(DOWNSTREAM_RULE));
    }

    #[test]
    fn test_builtin_rules_sorted_by_name() {
        let rules = RuleSet::builtin();
        let names: Vec<&str> = rules.rules().iter().map(ErrorRule::name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_no_match() {
        let rules = RuleSet::builtin();
        assert_eq!(rules.find("Finished: SUCCESS\nall good"), None);
        assert_eq!(rules.find(""), None);
    }

    #[test]
    fn test_earliest_line_wins() {
        let rules = RuleSet::from_json(
            r#"{"A: second": ["beta"], "B: first": ["alpha"]}"#,
        )
        .unwrap();

        let found = rules.scan("noise\nalpha happened\nbeta happened").unwrap();
        assert_eq!(found.rule, "B: first");
        assert_eq!(found.line_number, 2);
        assert_eq!(found.line, "alpha happened");
    }

    #[test]
    fn test_name_order_breaks_ties_on_same_line() {
        let rules = RuleSet::from_json(
            r#"{"Z: late": ["boom"], "A: early": ["bo+m"]}"#,
        )
        .unwrap();

        assert_eq!(rules.find("boom"), Some("A: early"));
    }

    #[test]
    fn test_invalid_patterns_dropped() {
        let rules = RuleSet::from_json(r#"{"bad": ["("], "good": ["ok"]}"#).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.find("ok"), Some("good"));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(RuleSet::from_json("[1,2,3]").is_err());
    }

    #[test]
    fn test_from_rules_normalises_order() {
        let rules = RuleSet::from_rules(vec![
            ErrorRule::new("b", &["x"]).unwrap(),
            ErrorRule::new("a", &["x"]).unwrap(),
        ]);
        assert_eq!(rules.find("x"), Some("a"));
    }
}
