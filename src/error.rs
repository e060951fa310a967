use thiserror::Error;

/// Main error type for tokendb operations
#[derive(Error, Debug)]
pub enum TokenDbError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Corrupt value at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for tokendb operations
pub type Result<T> = std::result::Result<T, TokenDbError>;

impl TokenDbError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        TokenDbError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn corrupt(key: &[u8], reason: impl ToString) -> Self {
        TokenDbError::Corrupt {
            key: String::from_utf8_lossy(key).into_owned(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TokenDbError::NotFound { .. })
    }

    /// Check if this error indicates a transient failure that a caller could retry.
    /// The engine itself never retries.
    pub fn is_retriable(&self) -> bool {
        matches!(self, TokenDbError::Store(_) | TokenDbError::Io(_))
    }
}
