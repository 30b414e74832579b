//! Error types for artifact parsing.

/// Errors raised while reading an xmake artifact.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Failed to unmarshal content of '{file}': {source}")]
    Unmarshal {
        file: String,
        source: serde_json::Error,
    },

    #[error("Content of '{file}' is not a JSON object")]
    NotAnObject { file: String },

    #[error("Field '{field}' of '{file}' has an unexpected shape: {source}")]
    InvalidField {
        file: String,
        field: &'static str,
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Name of the artifact that failed to parse.
    pub fn file(&self) -> &str {
        match self {
            Self::Unmarshal { file, .. }
            | Self::NotAnObject { file }
            | Self::InvalidField { file, .. } => file,
        }
    }
}
