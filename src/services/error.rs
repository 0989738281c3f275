use thiserror::Error;

use super::Operation;
use crate::{auth::AuthError, db::DbError, retention::RetentionAbort};

/// Errors surfaced by governance operations.
///
/// Per-row failures inside bulk purges never appear here; they are logged
/// and counted in the purge stats.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// Guard failure; raised before any data is touched.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The current settings forbid the operation.
    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A retention run stopped part-way.
    #[error(transparent)]
    RunAbort(#[from] RetentionAbort),

    /// The same operation is already running.
    #[error("Operation '{0}' is already running")]
    Busy(Operation),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type GovernanceResult<T> = Result<T, GovernanceError>;
