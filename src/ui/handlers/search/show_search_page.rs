use anyhow::Context;
use askama::Template;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    db::{Entry, EntryQuery, EntryStatus},
    ui::{
        AppState,
        error::AppError,
        routes::{Route, search_page_url, search_query_string},
        session::UserSession,
        view::{HtmlTemplate, ViewContext},
    },
};

pub const ENTRIES_PER_PAGE: i64 = 100;

#[derive(Debug, serde::Deserialize)]
pub struct SearchPageQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    offset: i64,
}

struct SearchResult {
    entry: Entry,
    route: String,
}

#[derive(Template)]
#[template(path = "search.html")]
struct SearchTemplate {
    view: ViewContext,
    search_query: String,
    total: i64,
    results: Vec<SearchResult>,
    prev_page_url: Option<String>,
    next_page_url: Option<String>,
}

pub async fn show_search_page(
    State(state): State<AppState>,
    session: UserSession,
    Query(query): Query<SearchPageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .data
        .get_user_by_id(&session.user_id)
        .await
        .context("error getting user")?
        .ok_or_else(|| AppError::NoAuth("user not found".to_string()))?;

    let search_query = query.q.trim().to_string();
    let offset = query.offset.max(0);
    let base_path = state.config.base_path.as_str();

    let (entries, total) = if search_query.is_empty() {
        (vec![], 0)
    } else {
        let entry_query = EntryQuery::new(&user.id)
            .with_search_query(&search_query)
            .without_status(EntryStatus::Removed)
            .with_direction(user.entry_direction);

        let total = state
            .data
            .count_entries(&entry_query)
            .await
            .context("error counting search results")?;

        let entries = state
            .data
            .get_entries(&entry_query.with_offset(offset).with_limit(ENTRIES_PER_PAGE))
            .await
            .context("error getting search results")?;

        (entries, total)
    };

    let query_string = search_query_string(&search_query);
    let results = entries
        .into_iter()
        .map(|entry| {
            let route = format!(
                "{}{}",
                Route::SearchEntry {
                    entry_id: &entry.id
                }
                .path(base_path),
                query_string
            );
            SearchResult { entry, route }
        })
        .collect();

    let prev_page_url = (offset > 0).then(|| {
        search_page_url(
            base_path,
            &search_query,
            (offset - ENTRIES_PER_PAGE).max(0),
        )
    });
    let next_offset = offset.saturating_add(ENTRIES_PER_PAGE);
    let next_page_url =
        (next_offset < total).then(|| search_page_url(base_path, &search_query, next_offset));

    let view = ViewContext::load(&state, &session.session, user, "search").await;

    Ok(HtmlTemplate(SearchTemplate {
        view,
        search_query,
        total,
        results,
        prev_page_url,
        next_page_url,
    }))
}
