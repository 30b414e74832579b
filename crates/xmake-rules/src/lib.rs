//! Error rules for xmake console logs.
//!
//! An error rule is a human-readable failure message plus the regular
//! expressions that recognise it in a Jenkins console log. The rule set is
//! consulted when a failed build did not publish structured error data.

mod error;
mod rule;
mod set;

pub use error::RuleError;
pub use rule::ErrorRule;
pub use set::{RuleMatch, RuleSet};

/// Rules shipped with the lane, as a JSON object of rule name to patterns.
pub const BUILTIN_RULES_JSON: &str = include_str!("../rules/xmake_error_rules.json");
