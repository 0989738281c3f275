//! Admin HTTP surface for support data governance.

mod backup;
mod error;
mod exports;
mod reset;
mod session;
mod settings;

use std::time::Duration;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
pub use error::{AdminError, ErrorInfo, ErrorResponse};
pub use session::AdminSession;
use tower_http::timeout::TimeoutLayer;

use crate::{AppState, config::ServerConfig, services::Services};

fn get_services(state: &AppState) -> Result<&Services, AdminError> {
    state.services.as_ref().ok_or(AdminError::DatabaseRequired)
}

/// Requests running past `timeout` are answered with 408.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

pub fn get_admin_routes(server: &ServerConfig) -> Router<AppState> {
    Router::new().nest("/v1", admin_v1_routes(server))
}

fn admin_v1_routes(server: &ServerConfig) -> Router<AppState> {
    let ordinary = Router::new()
        .route("/support/backup", post(backup::run))
        .route("/support/backup/snapshot", get(exports::backup_snapshot))
        .route("/support/learning/reset", post(reset::learning))
        .route("/support/audit-logs/export", get(exports::audit_logs))
        .route(
            "/support/settings",
            get(settings::get).put(settings::update),
        )
        .layer(timeout_layer(server.request_timeout()));

    // A whole-tenant purge gets the extended execution allowance.
    let long_running = Router::new()
        .route("/support/hard-reset", post(reset::hard_reset))
        .layer(timeout_layer(server.hard_reset_timeout()));

    ordinary.merge(long_running)
}
