//! Rule loading errors.

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Failed to unmarshal error rules: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid regex '{pattern}' in rule '{rule}': {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        source: regex_lite::Error,
    },

    #[error("rule '{0}' has no usable pattern")]
    NoPatterns(String),
}
