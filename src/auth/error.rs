use std::fmt;

#[derive(Debug)]
pub enum AuthError {
    /// No identity could be resolved from the session
    Unauthenticated,

    /// Identity resolved, but lacks the required role
    Forbidden(String),

    /// Internal error during authentication (e.g. user store unavailable)
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable code for responses and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Forbidden(_) => "forbidden",
            AuthError::Internal(_) => "internal_error",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Unauthenticated => write!(f, "Authentication required"),
            AuthError::Forbidden(msg) => write!(f, "Access forbidden: {}", msg),
            AuthError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<crate::db::DbError> for AuthError {
    fn from(err: crate::db::DbError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
