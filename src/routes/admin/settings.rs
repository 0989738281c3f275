use axum::{Json, extract::State};
use serde_json::{Map, Value as JsonValue};

use super::{AdminError, AdminSession, get_services};
use crate::{AppState, services::SettingsView};

/// Current settings, resolved and raw
///
/// `GET /admin/v1/support/settings`
pub async fn get(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> Result<Json<SettingsView>, AdminError> {
    let services = get_services(&state)?;
    Ok(Json(services.settings.get(&session).await?))
}

/// Merge values into the settings record; `null` resets a key to its default
///
/// `PUT /admin/v1/support/settings`
#[tracing::instrument(name = "admin.support.settings_update", skip_all)]
pub async fn update(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Json(patch): Json<Map<String, JsonValue>>,
) -> Result<Json<SettingsView>, AdminError> {
    let services = get_services(&state)?;
    Ok(Json(services.settings.update(&session, patch).await?))
}
