/// Errors from credential operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The configured cost parameters are out of range.
    #[error("invalid hasher parameters: {0}")]
    InvalidParams(String),

    /// Hashing failed inside the underlying library.
    #[error("hashing failed: {0}")]
    Hashing(String),

    /// A stored hash could not be parsed.
    #[error("malformed password hash: {0}")]
    MalformedHash(String),
}

/// Result alias for credential operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
