use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{auth::AuthError, db::DbError, observability::metrics, services::GovernanceError};

/// Error body: `{"error": {"type": "...", "code": "...", "message": "..."}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error class (e.g., "auth_failure", "policy_violation")
    #[serde(rename = "type")]
    pub error_type: String,
    /// Machine-readable code
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorInfo {
                error_type: error_type.to_string(),
                code: code.to_string(),
                message: message.into(),
            },
        }
    }
}

#[derive(Debug)]
pub enum AdminError {
    Unauthorized,
    Forbidden(String),
    PolicyViolation(String),
    Busy(String),
    Validation(String),
    DatabaseRequired,
    Database(DbError),
    Internal(String),
}

impl From<DbError> for AdminError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(msg) => AdminError::Validation(msg),
            DbError::NotConfigured => AdminError::DatabaseRequired,
            _ => AdminError::Database(err),
        }
    }
}

impl From<AuthError> for AdminError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated => AdminError::Unauthorized,
            AuthError::Forbidden(msg) => AdminError::Forbidden(msg),
            AuthError::Internal(msg) => AdminError::Internal(msg),
        }
    }
}

impl From<GovernanceError> for AdminError {
    fn from(err: GovernanceError) -> Self {
        match err {
            GovernanceError::Auth(e) => e.into(),
            GovernanceError::PolicyViolation(msg) => AdminError::PolicyViolation(msg),
            GovernanceError::Validation(msg) => AdminError::Validation(msg),
            GovernanceError::Busy(op) => {
                AdminError::Busy(format!("Operation '{}' is already running", op))
            }
            GovernanceError::Database(e) => e.into(),
            e @ GovernanceError::RunAbort(_) => AdminError::Internal(e.to_string()),
            GovernanceError::Internal(msg) => AdminError::Internal(msg),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, code, message, error_type) = match self {
            AdminError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "No resolvable identity".to_string(),
                "auth_failure",
            ),
            AdminError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, "auth_failure"),
            AdminError::PolicyViolation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "policy_violation",
                msg,
                "policy_violation",
            ),
            AdminError::Busy(msg) => (StatusCode::CONFLICT, "operation_running", msg, "conflict"),
            AdminError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                msg,
                "validation_error",
            ),
            AdminError::DatabaseRequired => (
                StatusCode::NOT_IMPLEMENTED,
                "feature_not_available",
                "This endpoint requires a configured database.".to_string(),
                "internal_error",
            ),
            AdminError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "An internal database error occurred".to_string(),
                    "internal_error",
                )
            }
            AdminError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    "internal_error",
                )
            }
        };

        if error_type == "auth_failure" {
            metrics::record_auth_failure(code);
        }

        (status, Json(ErrorResponse::new(error_type, code, message))).into_response()
    }
}
