use std::path::PathBuf;
use std::time::Duration;

/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another document already holds this value of a unique field.
    #[error("duplicate value for unique field {field}: {value}")]
    UniqueViolation { field: String, value: String },

    /// A document was inserted without a string `_id`.
    #[error("document has no _id")]
    MissingId,

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisting did not finish before the deadline.
    #[error("persistence timed out after {0:?}")]
    Timeout(Duration),

    /// The backing file exists but does not hold a valid collection.
    #[error("corrupt store file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
