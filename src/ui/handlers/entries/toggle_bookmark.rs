use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::ui::{
    AppState,
    error::{AppError, JsonError},
    session::UserSession,
};

pub async fn toggle_bookmark(
    State(state): State<AppState>,
    session: UserSession,
    headers: HeaderMap,
    Path(entry_id): Path<String>,
) -> Result<impl IntoResponse, JsonError> {
    session.verify_csrf(&headers)?;

    let starred = state
        .data
        .toggle_bookmark(&session.user_id, &entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("entry {entry_id}")))?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "starred": starred }))).into_response())
}
