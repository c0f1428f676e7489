//! Request handlers. Successful bodies are wrapped as `{"d": ...}`.

mod account;
mod time_off;

pub use account::{
    get_profile_handler, login_handler, passphrase_handler, password_handler,
    reset_password_handler, signup_handler, update_profile_handler,
};
pub use time_off::{
    add_time_off_handler, all_time_off_handler, delete_time_off_handler, time_off_handler,
    time_off_today_handler, time_off_types_handler,
};

use axum::response::Json;
use recess_types::DocumentId;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{ServerError, ServerResult};

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "d": {
            "status": "ok",
            "name": "recess-server",
            "version": env!("CARGO_PKG_VERSION"),
        }
    }))
}

fn data<T: Serialize>(value: T) -> ServerResult<Json<Value>> {
    let value = serde_json::to_value(value).map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok(Json(json!({ "d": value })))
}

fn message(text: &str) -> ServerResult<Json<Value>> {
    data(json!({ "message": text }))
}

/// A negative outcome that is not an error: wrong password, nothing to
/// delete, and the like.
fn rejected(text: &str) -> ServerResult<Json<Value>> {
    data(json!({ "error": true, "message": text }))
}

fn user_id(raw: &str) -> ServerResult<DocumentId> {
    DocumentId::parse(raw).map_err(|_| ServerError::NotFound(format!("user not found: {raw}")))
}

/// A required text field from a request body.
fn required<'a>(value: &'a Option<String>, message: &str) -> ServerResult<&'a str> {
    value
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest(message.to_string()))
}
