use axum::extract::{Path, State};
use axum::response::Json;
use recess_entity::{EntityError, PasswordChange, UserService};
use recess_types::Document;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{data, message, rejected, required, user_id};
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirmed_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub confirmed_password: Option<String>,
}

pub async fn signup_handler(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ServerResult<Json<Value>> {
    let password = required(&req.password, "Password is required.")?;
    if req.confirmed_password.as_deref() != Some(password) {
        return Err(ServerError::BadRequest(
            "Confirmed password should be equal to password.".into(),
        ));
    }
    state.users.check_strength(password).map_err(EntityError::from)?;

    let mut input = Document::new().with("password", password);
    for (field, value) in [
        ("username", &req.username),
        ("firstName", &req.first_name),
        ("lastName", &req.last_name),
        ("email", &req.email),
    ] {
        if let Some(value) = value {
            input.insert(field, value.as_str());
        }
    }

    let user = state.users.create_user(input).await?;
    info!(username = ?user.get_str("username"), "signed up");
    data(json!({ "message": "Successful sign up.", "user": UserService::safe_view(&user) }))
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ServerResult<Json<Value>> {
    let (Some(username), Some(password)) = (req.username.as_deref(), req.password.as_deref()) else {
        return Err(ServerError::BadRequest(
            "Username and password are required.".into(),
        ));
    };
    match state.users.verify_credentials(username, password).await? {
        Some(user) => data(json!({ "message": "Successful login.", "user": user })),
        None => rejected("Incorrect username or password."),
    }
}

pub async fn get_profile_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Value>> {
    let id = user_id(&id)?;
    let user = state
        .users
        .find_by_id(&id)
        .await
        .ok_or_else(|| ServerError::NotFound(format!("user not found: {id}")))?;
    data(UserService::safe_view(&user))
}

/// Only first name, last name, and username are taken from the body.
pub async fn update_profile_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ServerResult<Json<Value>> {
    let id = user_id(&id)?;
    let input = Document::from_value(body).map_err(|e| ServerError::BadRequest(e.to_string()))?;
    let user = state
        .users
        .update_profile(&id, &input)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("user not found: {id}")))?;
    data(json!({ "message": "Profile updated.", "user": UserService::safe_view(&user) }))
}

pub async fn password_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChangePasswordRequest>,
) -> ServerResult<Json<Value>> {
    let id = user_id(&id)?;
    let current = required(&req.old_password, "Current password is required.")?;
    let new = required(&req.new_password, "New password is required.")?;
    if req.confirmed_password.as_deref() != Some(new) {
        return Err(ServerError::BadRequest(
            "Confirmed password should be equal to new password.".into(),
        ));
    }

    let outcome = state.users.change_password(&id, current, new).await?;
    match outcome {
        PasswordChange::Changed(_) => message(outcome.message()),
        PasswordChange::WrongCurrentPassword | PasswordChange::RecentlyUsed => {
            rejected(outcome.message())
        }
    }
}

/// The new passphrase is returned once and never stored in plaintext.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Value>> {
    let id = user_id(&id)?;
    let passphrase = state.users.reset_password(&id).await?;
    data(json!({ "message": "Password reset.", "passphrase": passphrase }))
}

pub async fn passphrase_handler(State(state): State<AppState>) -> ServerResult<Json<Value>> {
    let passphrase = state.users.generate_passphrase()?;
    data(json!({ "passphrase": passphrase }))
}
