use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::Utc;
use recess_entity::{AddTimeOff, DeleteTimeOff, TimeManagementService};
use recess_types::DocumentId;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{data, message, rejected, required, user_id};
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddTimeOffRequest {
    pub date: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteTimeOffQuery {
    pub date: Option<String>,
}

async fn existing_user(state: &AppState, raw: &str) -> ServerResult<DocumentId> {
    let id = user_id(raw)?;
    match state.users.find_by_id(&id).await {
        Some(_) => Ok(id),
        None => Err(ServerError::NotFound(format!("user not found: {id}"))),
    }
}

pub async fn time_off_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Value>> {
    let id = existing_user(&state, &id).await?;
    let dates = state.time_off.time_off(&id).await;
    data(json!({ "userId": id.to_string(), "dates": dates }))
}

pub async fn add_time_off_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddTimeOffRequest>,
) -> ServerResult<Json<Value>> {
    let id = existing_user(&state, &id).await?;
    let date = required(&req.date, "A date is required.")?;
    let reason = required(&req.reason, "A reason is required.")?;
    match state.time_off.add_time_off(&id, date, reason).await? {
        AddTimeOff::AlreadyExists => rejected(AddTimeOff::AlreadyExists.message()),
        outcome => message(outcome.message()),
    }
}

/// `DELETE /api/users/:id/time-off?date=YYYY-MM-DD`
pub async fn delete_time_off_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteTimeOffQuery>,
) -> ServerResult<Json<Value>> {
    let id = user_id(&id)?;
    let date = required(&query.date, "A date is required.")?;
    match state.time_off.delete_time_off(&id, date).await? {
        DeleteTimeOff::Deleted => message(DeleteTimeOff::Deleted.message()),
        DeleteTimeOff::NothingToDelete => rejected(DeleteTimeOff::NothingToDelete.message()),
    }
}

pub async fn all_time_off_handler(State(state): State<AppState>) -> ServerResult<Json<Value>> {
    data(state.time_off.all_time_off(&state.users).await)
}

/// Today is the server's current UTC date.
pub async fn time_off_today_handler(State(state): State<AppState>) -> ServerResult<Json<Value>> {
    let today = Utc::now().date_naive();
    data(state.time_off.time_off_on(&state.users, today).await)
}

pub async fn time_off_types_handler() -> ServerResult<Json<Value>> {
    data(TimeManagementService::time_off_types())
}
