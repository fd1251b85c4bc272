use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

mod config;
mod db;
mod ui;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let crate_name = env!("CARGO_CRATE_NAME");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::from(format!(
                "{crate_name}=debug,tower_http=info,sqlx=info,axum::rejection=trace"
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::new()?;
    let data = db::new_data(&config.database_url).await?;

    ui::start_ui(data, config.into()).await
}
