use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use axum_extra::headers::{Cookie, HeaderMapExt};

use crate::{
    db::Session,
    ui::{AppState, error::AppError},
};

pub const SESSION_COOKIE: &str = "session_id";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// The session of a signed-in user, resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub session: Session,
    pub user_id: String,
}

impl UserSession {
    /// State-changing requests must echo the session's CSRF token.
    pub fn verify_csrf(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let token = headers
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if token.is_empty() || token != self.session.csrf_token {
            return Err(AppError::NoAccess("invalid csrf token".to_string()));
        }

        Ok(())
    }
}

impl FromRequestParts<AppState> for UserSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session_id = parts
            .headers
            .typed_get::<Cookie>()
            .and_then(|cookie| cookie.get(SESSION_COOKIE).map(str::to_owned))
            .ok_or_else(|| AppError::NoAuth("missing session cookie".to_string()))?;

        let session = state
            .data
            .get_session(&session_id)
            .await?
            .ok_or_else(|| AppError::NoAuth("unknown session".to_string()))?;

        let user_id = session
            .user_id
            .clone()
            .ok_or_else(|| AppError::NoAuth("anonymous session".to_string()))?;

        Ok(UserSession { session, user_id })
    }
}
