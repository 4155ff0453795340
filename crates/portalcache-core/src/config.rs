//! Application configuration management.
//!
//! Holds the portal base URL, display language, HTTP timeout, and the last
//! event the user looked at.
//!
//! Configuration is stored at `~/.config/portalcache/config.json`; the local
//! store lives under `~/.cache/portalcache/`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::models::Language;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "portalcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment overrides
pub const BASE_URL_ENV: &str = "PORTALCACHE_BASE_URL";
pub const LANGUAGE_ENV: &str = "PORTALCACHE_LANG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub portal_base_url: String,
    /// Language code used for display ("en", "zh-TW", ...). `None` follows `LANG`.
    pub language: Option<String>,
    pub request_timeout_secs: u64,
    pub last_event_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal_base_url: DEFAULT_BASE_URL.to_string(),
            language: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            last_event_id: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Apply `PORTALCACHE_BASE_URL` / `PORTALCACHE_LANG` on top of the file
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.portal_base_url = url;
        }
        if let Some(lang) = lookup(LANGUAGE_ENV).filter(|v| !v.trim().is_empty()) {
            self.language = Some(lang);
        }
        self
    }

    /// The configured language code, else the system `LANG`, else empty
    pub fn language_code(&self) -> String {
        self.language
            .clone()
            .or_else(|| std::env::var("LANG").ok())
            .unwrap_or_default()
    }

    pub fn display_language(&self) -> Language {
        Language::from_code(&self.language_code())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
