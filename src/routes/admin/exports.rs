use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use axum_valid::Valid;
use serde::Deserialize;
use validator::Validate;

use super::{AdminError, AdminSession, get_services};
use crate::{
    AppState,
    services::{ExportFile, ExportFormat},
};

/// Query parameters for the audit log export
#[derive(Debug, Deserialize, Validate)]
pub struct AuditLogExportQuery {
    /// Newest entries to include (default 500)
    #[validate(range(min = 1, max = 10000))]
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub format: ExportFormat,
}

fn default_limit() -> u32 {
    500
}

/// Export served as a download
pub struct ExportResponse(pub ExportFile);

impl IntoResponse for ExportResponse {
    fn into_response(self) -> Response {
        let file = self.0;
        (
            [
                (header::CONTENT_TYPE, file.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file.filename),
                ),
            ],
            file.body,
        )
            .into_response()
    }
}

/// Export the action log
///
/// `GET /admin/v1/support/audit-logs/export?limit=&format=csv|json`
#[tracing::instrument(name = "admin.support.export_audit_logs", skip_all)]
pub async fn audit_logs(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Valid(Query(query)): Valid<Query<AuditLogExportQuery>>,
) -> Result<ExportResponse, AdminError> {
    let services = get_services(&state)?;
    let file = services
        .exports
        .audit_logs(&session, query.limit, query.format)
        .await?;
    Ok(ExportResponse(file))
}

/// Export a backup snapshot
///
/// `GET /admin/v1/support/backup/snapshot`
#[tracing::instrument(name = "admin.support.export_snapshot", skip_all)]
pub async fn backup_snapshot(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> Result<ExportResponse, AdminError> {
    let services = get_services(&state)?;
    Ok(ExportResponse(services.exports.backup_snapshot(&session).await?))
}
