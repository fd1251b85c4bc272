use anyhow::Context;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    db::{Entry, EntryNeighbor, EntryPagination, EntryQuery, EntryStatus},
    ui::{
        AppState,
        error::AppError,
        routes::{Route, search_page_url, search_query_string},
        session::UserSession,
        view::{HtmlTemplate, ViewContext},
    },
};

#[derive(Debug, serde::Deserialize)]
pub struct SearchEntryQuery {
    #[serde(default)]
    q: String,
}

#[derive(Template)]
#[template(path = "entry.html")]
struct EntryTemplate {
    view: ViewContext,
    search_query: String,
    query_string: String,
    back_route: String,
    bookmark_route: String,
    entry: Entry,
    prev_entry: Option<EntryNeighbor>,
    next_entry: Option<EntryNeighbor>,
    prev_entry_route: Option<String>,
    next_entry_route: Option<String>,
}

/// Shows one entry of a search result and links to its neighbors in
/// that result. Opening an unread entry marks it as read.
#[tracing::instrument(skip(state, session, query), fields(user_id = %session.user_id))]
pub async fn show_search_entry(
    State(state): State<AppState>,
    session: UserSession,
    Path(entry_id): Path<String>,
    Query(query): Query<SearchEntryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .data
        .get_user_by_id(&session.user_id)
        .await
        .context("error getting user")?
        .ok_or_else(|| AppError::NoAuth("user not found".to_string()))?;

    let search_query = query.q;

    let entry_query = EntryQuery::new(&user.id)
        .with_search_query(&search_query)
        .with_entry_id(&entry_id)
        .without_status(EntryStatus::Removed);

    let mut entry = state
        .data
        .get_entry(&entry_query)
        .await
        .context("error getting entry")?
        .ok_or_else(|| AppError::NotFound(format!("entry {entry_id}")))?;

    if entry.is_unread() {
        state
            .data
            .set_entries_status(&user.id, &[entry.id.clone()], EntryStatus::Read)
            .await
            .with_context(|| format!("error marking entry {} as read", entry.id))?;

        entry.status = EntryStatus::Read;
    }

    let pagination = EntryPagination::new(&user.id, &entry.id, user.entry_direction)
        .with_search_query(&search_query);

    let neighbors = state
        .data
        .get_entry_neighbors(&pagination)
        .await
        .context("error getting entry neighbors")?;

    let base_path = state.config.base_path.as_str();
    let entry_route = |neighbor: &EntryNeighbor| {
        Route::SearchEntry {
            entry_id: &neighbor.id,
        }
        .path(base_path)
    };

    let prev_entry_route = neighbors.prev.as_ref().map(entry_route);
    let next_entry_route = neighbors.next.as_ref().map(entry_route);

    let bookmark_route = Route::ToggleBookmark {
        entry_id: &entry.id,
    }
    .path(base_path);
    let back_route = search_page_url(base_path, &search_query, 0);
    let query_string = search_query_string(&search_query);

    let view = ViewContext::load(&state, &session.session, user, "search").await;

    Ok(HtmlTemplate(EntryTemplate {
        view,
        search_query,
        query_string,
        back_route,
        bookmark_route,
        entry,
        prev_entry: neighbors.prev,
        next_entry: neighbors.next,
        prev_entry_route,
        next_entry_route,
    }))
}
