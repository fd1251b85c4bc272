use askama::Template;
use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),

    #[error("no access: {0}")]
    NoAccess(String),

    #[error("no auth: {0}")]
    NoAuth(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, Option<String>) {
        match self {
            AppError::UnexpectedError(err) => {
                tracing::error!("unexpected error: {err:#}");

                #[cfg(debug_assertions)]
                let error_message = Some(format!("{err:#}"));
                #[cfg(not(debug_assertions))]
                let error_message = Some("unexpected error".to_string());

                (StatusCode::INTERNAL_SERVER_ERROR, error_message)
            }
            AppError::NoAuth(_) => (StatusCode::UNAUTHORIZED, None),
            AppError::NoAccess(details) => (StatusCode::FORBIDDEN, Some(details.clone())),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, None),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, Some(err.clone())),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status: u16,
    reason: &'static str,
    message: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = self.status_and_message();
        let reason = status_code.canonical_reason().unwrap_or("Error");

        let page = ErrorTemplate {
            status: status_code.as_u16(),
            reason,
            message: error_message,
        };

        match page.render() {
            Ok(html) => (status_code, Html(html)).into_response(),
            Err(err) => {
                tracing::error!("error rendering error page: {err}");
                (status_code, reason).into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::UnexpectedError(anyhow::anyhow!(err))
    }
}

/// [`AppError`] for endpoints called from scripts: same status codes, JSON body.
#[derive(Debug)]
pub struct JsonError(pub AppError);

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = self.0.status_and_message();
        let error_message = error_message
            .unwrap_or_else(|| status_code.canonical_reason().unwrap_or("error").to_lowercase());

        (status_code, Json(json!({ "error": error_message }))).into_response()
    }
}

impl From<AppError> for JsonError {
    fn from(err: AppError) -> Self {
        JsonError(err)
    }
}

impl From<anyhow::Error> for JsonError {
    fn from(err: anyhow::Error) -> Self {
        JsonError(AppError::UnexpectedError(err))
    }
}

impl From<sqlx::Error> for JsonError {
    fn from(err: sqlx::Error) -> Self {
        JsonError(AppError::from(err))
    }
}
