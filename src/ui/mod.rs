use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::db::Data;

mod error;
mod handlers;
mod headers;
mod routes;
mod session;
mod view;


pub struct UiConfig {
    pub host: String,
    pub base_path: String,
    pub static_dir: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub data: Data,
    pub config: Arc<UiConfig>,
}

pub fn router(state: AppState, static_dir: Option<&str>) -> Router {
    let mut ui_routes = Router::new()
        .route(routes::SEARCH, get(handlers::search::show_search_page))
        .route(
            routes::SEARCH_ENTRY,
            get(handlers::entries::show_search_entry),
        )
        .route(
            routes::UPDATE_ENTRIES_STATUS,
            post(handlers::entries::update_entries_status),
        )
        .route(
            routes::TOGGLE_BOOKMARK,
            post(handlers::entries::toggle_bookmark),
        )
        .route(routes::HEALTH, get(health));

    if let Some(dir) = static_dir {
        ui_routes = ui_routes.nest_service(routes::STATIC, ServeDir::new(dir));
    }

    let ui_routes = ui_routes
        .layer(middleware::from_fn(headers::add_headers))
        .with_state(state.clone());

    let router = match state.config.base_path.as_str() {
        "" => ui_routes,
        base_path => Router::new().nest(base_path, ui_routes),
    };

    router.layer(TraceLayer::new_for_http())
}

pub async fn start_ui(data: Data, config: UiConfig) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let state = AppState {
        data,
        config: config.clone(),
    };

    let app = router(state, config.static_dir.as_deref());

    let listener = TcpListener::bind(&config.host)
        .await
        .with_context(|| format!("error binding to {}", config.host))?;
    tracing::info!(
        "listening at {}{}",
        listener.local_addr().context("error reading local address")?,
        config.base_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("error serving ui")?;

    tracing::info!("ui stopped");

    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("error listening for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("error listening for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
