//! Configuration loading and validation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const STORE_URL_ENV: &str = "JOIN_STORE_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub ui: UiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the realtime database, without the `.json` suffix
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerMode {
    /// Press and move starts a drag right away
    Mouse,
    /// A long press is needed before moving drags a card
    Touch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub pointer: PointerMode,
    /// How long a touch must be held before it picks up a card
    pub long_press_ms: u64,
    /// Terminals narrower than this stack the columns vertically
    pub stacked_below_width: u16,
    /// Event poll interval
    pub tick_rate_ms: u64,
    pub toast_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where session files are kept; defaults to the user data directory
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub level: String,
    /// Log file; defaults to `join.log` in the user data directory
    pub file: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            pointer: PointerMode::Mouse,
            long_press_ms: 500,
            stacked_below_width: 100,
            tick_rate_ms: 100,
            toast_seconds: 3,
        }
    }
}

impl UiConfig {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.toast_seconds)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        log::LevelFilter::from_str(&self.level).unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Loads the first config file found, applies the environment and validates.
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };
        if let Ok(url) = std::env::var(STORE_URL_ENV) {
            config.store.url = url;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        log::debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    fn find_config_file() -> Option<PathBuf> {
        let local = PathBuf::from("join.toml");
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("join").join("config.toml"))
            .filter(|path| path.exists())
    }

    pub fn session_dir(&self) -> Result<PathBuf> {
        self.session
            .dir
            .clone()
            .or_else(crate::session::SessionStore::default_dir)
            .ok_or_else(|| Error::Config("no data directory available for session files".to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.store.url.trim();
        if url.is_empty() {
            return Err(Error::Config(format!(
                "store url is not set; add [store] url to join.toml or set {}",
                STORE_URL_ENV
            )));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(Error::Config(format!("store url must be http(s), got '{}'", url)));
        }
        if !(100..=5000).contains(&self.ui.long_press_ms) {
            return Err(Error::Config(format!(
                "long_press_ms must be between 100 and 5000, got {}",
                self.ui.long_press_ms
            )));
        }
        if !(10..=1000).contains(&self.ui.tick_rate_ms) {
            return Err(Error::Config(format!(
                "tick_rate_ms must be between 10 and 1000, got {}",
                self.ui.tick_rate_ms
            )));
        }
        if log::LevelFilter::from_str(&self.logging.level).is_err() {
            return Err(Error::Config(format!("unknown log level '{}'", self.logging.level)));
        }
        Ok(())
    }
}
