use thiserror::Error;

/// Failures reported by a page accessor.
///
/// "Nothing matched" is never an error: accessors return an empty list for
/// that. These variants describe the accessor itself failing.
#[derive(Error, Debug, Clone)]
pub enum AccessorError {
    #[error("Structural query failed: {0}")]
    Query(String),

    #[error("Node {id} is detached from the document")]
    NodeDetached { id: u32 },

    #[error("Script execution error: {0}")]
    Script(String),

    #[error("Timeout: {operation}")]
    Timeout { operation: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Other: {0}")]
    Other(String),
}

impl From<serde_json::Error> for AccessorError {
    fn from(err: serde_json::Error) -> Self {
        AccessorError::Serialization(err.to_string())
    }
}

impl AccessorError {
    /// Short machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            AccessorError::Query(_) => "QUERY_FAILED",
            AccessorError::NodeDetached { .. } => "NODE_DETACHED",
            AccessorError::Script(_) => "SCRIPT_ERROR",
            AccessorError::Timeout { .. } => "TIMEOUT",
            AccessorError::Serialization(_) => "SERIALIZATION_ERROR",
            AccessorError::NotSupported(_) => "NOT_SUPPORTED",
            AccessorError::Other(_) => "INTERNAL_ERROR",
        }
    }
}
