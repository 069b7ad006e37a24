use thiserror::Error;

/// Errors from document store operations (used by trait definitions in parley-core).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("document store unavailable")]
    Unavailable,

    #[error("duplicate key: session '{0}' already exists")]
    DuplicateKey(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Errors related to session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}
