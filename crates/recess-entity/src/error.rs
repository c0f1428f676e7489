use serde::Serialize;

use recess_crypto::CryptoError;
use recess_store::StoreError;

/// Input that violates an entity's constraints. Detected before any
/// mutation, so it never leaves partial state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("All required properties are not present on object. The property '{0}' was not in the object.")]
    MissingField(String),

    #[error("{field} '{value}' is already taken.")]
    Duplicate { field: String, value: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("{0}")]
    WeakPassword(String),
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from entity service operations.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The identity did not match a stored document, for operations that
    /// need one to exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The backing store could not be read or written; the mutation was
    /// rolled back.
    #[error("persistence error: {0}")]
    Persistence(StoreError),

    /// Hashing or another internal step failed.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by boundary adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "ValidationError")]
    Validation,
    NotFound,
    #[serde(rename = "PersistenceError")]
    Persistence,
    #[serde(rename = "InternalError")]
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "ValidationError",
            Self::NotFound => "NotFound",
            Self::Persistence => "PersistenceError",
            Self::Internal => "InternalError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EntityError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for EntityError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation { field, value } => {
                Self::Validation(ValidationError::Duplicate { field, value })
            }
            other => Self::Persistence(other),
        }
    }
}

impl From<CryptoError> for EntityError {
    fn from(e: CryptoError) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Result alias for entity operations.
pub type EntityResult<T> = Result<T, EntityError>;
