use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use recess_entity::{EntityError, ErrorKind};
use serde_json::json;
use thiserror::Error;
use tracing::error;

const GENERIC_FAILURE: &str = "The request could not be completed. Please try again later.";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Malformed request input detected at the boundary.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[from] recess_store::StoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] recess_crypto::CryptoError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Entity(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Persistence | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => ErrorKind::Validation.as_str(),
            Self::NotFound(_) => ErrorKind::NotFound.as_str(),
            Self::Entity(e) => e.kind().as_str(),
            Self::Store(_) => ErrorKind::Persistence.as_str(),
            _ => ErrorKind::Internal.as_str(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, kind = self.kind(), "request failed");
            GENERIC_FAILURE.to_string()
        } else {
            self.to_string()
        };
        let body = json!({ "error": true, "kind": self.kind(), "message": message });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recess_entity::ValidationError;
    use recess_store::StoreError;

    #[test]
    fn validation_is_bad_request() {
        let err: ServerError =
            EntityError::from(ValidationError::MissingField("email".into())).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "ValidationError");
        assert!(err.to_string().contains("'email'"));
    }

    #[test]
    fn not_found_is_404() {
        let err = ServerError::NotFound("user not found".into());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn persistence_is_500() {
        let err: ServerError =
            EntityError::from(StoreError::Timeout(std::time::Duration::from_secs(5))).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "PersistenceError");
    }

    #[test]
    fn server_errors_hide_details() {
        let response = ServerError::Internal("disk at /secret exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
