use askama::Template;
use axum::response::{Html, IntoResponse, Response};

use crate::{
    db::{FlashMessages, Session, User},
    ui::{AppState, error::AppError, routes::Route},
};

pub struct HtmlTemplate<T>(pub T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => AppError::UnexpectedError(
                anyhow::Error::new(err).context("error rendering template"),
            )
            .into_response(),
        }
    }
}

/// Data every page layout needs: navigation counters, the signed-in user
/// and what the session carries for this request.
pub struct ViewContext {
    pub base_path: String,
    pub stylesheet: String,
    pub script: String,
    pub search_route: String,
    pub menu: &'static str,
    pub user: User,
    pub csrf_token: String,
    pub flash: FlashMessages,
    pub count_unread: i64,
    pub count_error_feeds: i64,
    pub has_save_entry: bool,
}

impl ViewContext {
    /// Counters and flash messages are best effort; a failing lookup is
    /// logged and the page renders without it.
    pub async fn load(state: &AppState, session: &Session, user: User, menu: &'static str) -> Self {
        let data = &state.data;

        let count_unread = data
            .count_unread_entries(&user.id)
            .await
            .unwrap_or_else(|err| {
                tracing::warn!("error counting unread entries: {err}");
                0
            });

        let count_error_feeds = data.count_error_feeds(&user.id).await.unwrap_or_else(|err| {
            tracing::warn!("error counting feeds with errors: {err}");
            0
        });

        let has_save_entry = data.has_save_entry(&user.id).await.unwrap_or_else(|err| {
            tracing::warn!("error checking save integrations: {err}");
            false
        });

        let flash = data
            .take_flash_messages(&session.id)
            .await
            .unwrap_or_else(|err| {
                tracing::warn!("error reading flash messages: {err}");
                FlashMessages::default()
            });

        let base_path = state.config.base_path.clone();

        ViewContext {
            stylesheet: Route::Static { file: "app.css" }.path(&base_path),
            script: Route::Static { file: "app.js" }.path(&base_path),
            search_route: Route::Search.path(&base_path),
            base_path,
            menu,
            user,
            csrf_token: session.csrf_token.clone(),
            flash,
            count_unread,
            count_error_feeds,
            has_save_entry,
        }
    }
}
