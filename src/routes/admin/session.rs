use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{AppState, auth::Session, models::PerformedVia};

/// Caller identity from the configured identity header.
///
/// Never rejects: a missing or unreadable header yields an anonymous session,
/// which the access guard turns into `401` for operations that need one.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = parts
            .headers
            .get(state.config.auth.identity_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(|value| Session::from_header_value(value, PerformedVia::Admin))
            .unwrap_or_else(|| Session::anonymous(PerformedVia::Admin));
        Ok(AdminSession(session))
    }
}
