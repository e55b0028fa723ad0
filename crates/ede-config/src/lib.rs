use std::env;

use serde::{Deserialize, Serialize};

use self::api::ApiConfig;
use self::list::ListConfig;
use self::notifications::NotificationConfig;
use self::polling::PollingConfig;
use self::upload::UploadConfig;

pub mod api;
pub mod list;
pub mod notifications;
pub mod polling;
pub mod upload;

fn default_tick_ms() -> u64 {
    250
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub list: ListConfig,
    pub polling: PollingConfig,
    pub notifications: NotificationConfig,
    pub upload: UploadConfig,

    /// Console housekeeping interval (notification expiry)
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("page size list is empty")]
    NoPageSizes,

    #[error("default page size {0} is not one of the allowed page sizes")]
    DefaultPageSize(u32),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl Config {
    /// Defaults overridden by `EDE_*` environment variables
    pub fn new() -> Self {
        let mut config = Config {
            api: ApiConfig::new(),
            ..Config::default()
        };

        if let Some(ms) = env_u64("EDE_DEBOUNCE_MS") {
            config.list.debounce_ms = ms;
        }
        if let Some(ms) = env_u64("EDE_POLL_MS") {
            config.polling.interval_ms = ms;
        }
        if let Some(ms) = env_u64("EDE_TOAST_MS") {
            config.notifications.dismiss_after_ms = ms;
        }
        if let Some(bytes) = env_u64("EDE_MAX_AUDIO_BYTES") {
            config.upload.max_audio_bytes = bytes as usize;
        }
        if let Some(ms) = env_u64("EDE_TICK_MS") {
            config.tick_ms = ms;
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.list.page_sizes.is_empty() {
            return Err(ConfigError::NoPageSizes);
        }
        if self.list.page_sizes.contains(&0) {
            return Err(ConfigError::Zero("page size"));
        }
        if !self.list.page_sizes.contains(&self.list.default_page_size) {
            return Err(ConfigError::DefaultPageSize(self.list.default_page_size));
        }
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::Zero("polling interval"));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Zero("tick interval"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            list: ListConfig::default(),
            polling: PollingConfig::default(),
            notifications: NotificationConfig::default(),
            upload: UploadConfig::default(),
            tick_ms: default_tick_ms(),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
