use crate::error::{ConfigError, Result};
use serde_derive::Deserialize;
use std::str::FromStr;

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppConfig {
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(self.log_level.as_str()).unwrap_or(tracing::Level::INFO)
    }
}

pub(crate) fn load_app_config() -> Result<AppConfig, ConfigError> {
    envy::from_env::<AppConfig>().map_err(ConfigError::env_parse)
}

fn default_poll_interval_sec() -> u64 {
    // The portal updates meter figures at most a few times a day; hourly
    // polling matches the upstream meter cadence.
    3600
}

fn default_cycle_timeout_sec() -> u64 {
    300
}

#[derive(Deserialize, Debug)]
pub struct PollerConfig {
    #[serde(default = "default_poll_interval_sec")]
    pub poll_interval_sec: u64,
    // upper bound for one full login+fetch+extract cycle
    #[serde(default = "default_cycle_timeout_sec")]
    pub cycle_timeout_sec: u64,
}

pub fn load_poller_config() -> Result<PollerConfig, ConfigError> {
    envy::prefixed("POLLER_").from_env::<PollerConfig>().map_err(ConfigError::env_parse)
}

fn default_base_url() -> String {
    "https://nj.myaccount.pseg.com".to_string()
}

fn default_http_timeout_sec() -> u64 {
    30
}

fn default_login_wait_sec() -> u64 {
    // The portal's post-login dashboard can take a long time to render
    // inside a headless browser.
    60
}

/// Portal-facing configuration.
///
/// `webdriver_url` points at an already-running WebDriver endpoint
/// (e.g. `http://localhost:9515`). When unset, the browser login strategy
/// attempts to spawn a local chromedriver itself.
#[derive(Deserialize, Debug, Clone)]
pub struct PsegConfig {
    pub username: String,
    pub password: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub webdriver_url: Option<String>,
    #[serde(default = "default_http_timeout_sec")]
    pub http_timeout_sec: u64,
    #[serde(default = "default_login_wait_sec")]
    pub login_wait_sec: u64,
}

pub(crate) fn load_pseg_config() -> Result<PsegConfig, ConfigError> {
    envy::prefixed("PSEG_").from_env::<PsegConfig>().map_err(ConfigError::env_parse)
}
