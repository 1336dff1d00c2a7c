use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub backend: BackendSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    /// Base URL of the RPC backend, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public (anon) API key, sent as `apikey` and bearer token.
    pub api_key: String,
    #[serde(default = "default_token_param")]
    pub token_param: String,
    #[serde(default = "default_panel_param")]
    pub panel_param: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl ServerSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("backend.{0} must not be empty")]
    Missing(&'static str),
    #[error("server.refresh_interval_secs must be greater than zero")]
    ZeroRefreshInterval,
}

fn default_token_param() -> String {
    "p_token".to_string()
}

fn default_panel_param() -> String {
    "p_panel".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    300
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.url.trim().is_empty() {
            return Err(ConfigError::Missing("url"));
        }
        if self.backend.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("api_key"));
        }
        if self.server.refresh_interval_secs == 0 {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        Ok(())
    }
}

/// Resolve configuration once at startup: optional `config/dashboard` file,
/// overridden by `DASHBOARD_*` environment variables
/// (`DASHBOARD_BACKEND__URL`, `DASHBOARD_BACKEND__API_KEY`, ...).
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}
