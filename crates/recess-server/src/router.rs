use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all Recess endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handler::health_handler))
        .route("/api/signup", post(handler::signup_handler))
        .route("/api/login", post(handler::login_handler))
        .route("/api/passphrase", get(handler::passphrase_handler))
        .route(
            "/api/users/:id/profile",
            get(handler::get_profile_handler).post(handler::update_profile_handler),
        )
        .route("/api/users/:id/password", post(handler::password_handler))
        .route(
            "/api/users/:id/password/reset",
            post(handler::reset_password_handler),
        )
        .route(
            "/api/users/:id/time-off",
            get(handler::time_off_handler)
                .post(handler::add_time_off_handler)
                .delete(handler::delete_time_off_handler),
        )
        .route("/api/time-off/all", get(handler::all_time_off_handler))
        .route("/api/time-off/today", get(handler::time_off_today_handler))
        .route("/api/time-off/types", get(handler::time_off_types_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
