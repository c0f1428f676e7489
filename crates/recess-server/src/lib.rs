//! HTTP server for Recess.
//!
//! Exposes account management (sign-up, login, profile, password change and
//! reset) and time-off tracking over JSON. Collections live in JSON files
//! under the configured data directory.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::RecessServer;
pub use state::AppState;
