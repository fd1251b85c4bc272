use anyhow::Context;
use dotenv::dotenv;
use serde::Deserialize;
use tracing::warn;

use crate::ui::UiConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub base_path: String,
    #[serde(default)]
    pub static_dir: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0:8000".to_string()
}

impl Config {
    pub fn new() -> Result<Self, anyhow::Error> {
        let _ = dotenv().map_err(|err| warn!("error loading .env: {:?}", err));
        Self::from_vars(std::env::vars())
    }

    fn from_vars<I>(vars: I) -> Result<Self, anyhow::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config =
            envy::from_iter::<_, Config>(vars).context("invalid environment variables")?;
        config.base_path = normalize_base_path(&config.base_path);
        Ok(config)
    }
}

/// `""` for the root, otherwise `/segment[/segment..]` without a trailing slash.
fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }

    format!("/{trimmed}")
}

impl From<Config> for UiConfig {
    fn from(config: Config) -> Self {
        UiConfig {
            host: config.host,
            base_path: config.base_path,
            static_dir: config.static_dir,
        }
    }
}
