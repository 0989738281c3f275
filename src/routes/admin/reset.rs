use axum::{Json, extract::State};

use super::{AdminError, AdminSession, get_services};
use crate::{
    AppState,
    services::{HardResetReport, LearningResetReport},
};

/// Irreversibly delete all support data
///
/// `POST /admin/v1/support/hard-reset`
#[tracing::instrument(name = "admin.support.hard_reset", skip_all)]
pub async fn hard_reset(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> Result<Json<HardResetReport>, AdminError> {
    let services = get_services(&state)?;
    Ok(Json(services.hard_reset.run(&session).await?))
}

/// Delete the learned triage examples
///
/// `POST /admin/v1/support/learning/reset`
#[tracing::instrument(name = "admin.support.learning_reset", skip_all)]
pub async fn learning(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> Result<Json<LearningResetReport>, AdminError> {
    let services = get_services(&state)?;
    Ok(Json(services.learning.run(&session).await?))
}
