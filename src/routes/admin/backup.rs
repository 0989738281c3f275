use axum::{Json, extract::State};
use serde::Deserialize;

use super::{AdminError, AdminSession, get_services};
use crate::{AppState, backup::BackupOutcome};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunBackupRequest {
    /// Run even if the schedule says it is not due
    pub force: bool,
}

/// Run a backup now
///
/// `POST /admin/v1/support/backup`
#[tracing::instrument(name = "admin.support.backup", skip_all)]
pub async fn run(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    body: Option<Json<RunBackupRequest>>,
) -> Result<Json<BackupOutcome>, AdminError> {
    let services = get_services(&state)?;
    let Json(request) = body.unwrap_or_default();

    let outcome = services.backup.run_manual(&session, request.force).await?;
    Ok(Json(outcome))
}
