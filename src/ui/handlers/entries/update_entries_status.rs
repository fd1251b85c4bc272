use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::{
    db::EntryStatus,
    ui::{
        AppState,
        error::{AppError, JsonError},
        session::UserSession,
    },
};

#[derive(serde::Deserialize)]
pub struct UpdateEntriesStatusBody {
    pub entry_ids: Vec<String>,
    pub status: EntryStatus,
}

pub async fn update_entries_status(
    State(state): State<AppState>,
    session: UserSession,
    headers: HeaderMap,
    Json(body): Json<UpdateEntriesStatusBody>,
) -> Result<impl IntoResponse, JsonError> {
    session.verify_csrf(&headers)?;

    if body.entry_ids.is_empty() {
        return Err(AppError::BadRequest("entry_ids must not be empty".to_string()).into());
    }

    if body.status == EntryStatus::Removed {
        return Err(AppError::BadRequest("status must be read or unread".to_string()).into());
    }

    state
        .data
        .set_entries_status(&session.user_id, &body.entry_ids, body.status)
        .await?;

    Ok((StatusCode::OK, Json(serde_json::json!({"success": true}))).into_response())
}
