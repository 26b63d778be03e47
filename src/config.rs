//! Runtime configuration
//!
//! Read from `--config <path>`, else `<config_home>/breakeven/config.toml`,
//! else built-in defaults. Every field is optional in the file.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const CONFIG_FILENAME: &str = "config.toml";

/// Set to any value other than "0" to replace the network price provider
/// with an offline source that returns no data.
pub const OFFLINE_ENV: &str = "BREAKEVEN_OFFLINE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Annual savings-account rate used as the opportunity cost
    pub savings_rate: Decimal,
    pub bulk: BulkConfig,
    pub provider: ProviderConfig,
    pub universe: UniverseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            savings_rate: dec!(0.05),
            bulk: BulkConfig::default(),
            provider: ProviderConfig::default(),
            universe: UniverseConfig::default(),
        }
    }
}

/// Worker pool sizing and pacing for bulk comparisons
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BulkConfig {
    pub concurrency: usize,
    pub retry_concurrency: usize,
    /// Pause after each lookup, per worker
    pub request_delay_ms: u64,
    pub retry_delay_ms: u64,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            retry_concurrency: 2,
            request_delay_ms: 1_000,
            retry_delay_ms: 2_000,
        }
    }
}

impl BulkConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            user_agent: "Mozilla/5.0 (compatible; BreakevenBot/1.0)".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UniverseConfig {
    pub source_url: String,
    pub cache_max_age_hours: i64,
    /// Overrides the platform cache directory
    pub cache_dir: Option<PathBuf>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            source_url: "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies".to_string(),
            cache_max_age_hours: 24,
            cache_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from an explicit path or the default location.
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join("breakeven").join(CONFIG_FILENAME))
}

/// True when `BREAKEVEN_OFFLINE` asks for no network access
pub fn offline_mode() -> bool {
    std::env::var(OFFLINE_ENV)
        .map(|v| v != "0")
        .unwrap_or(false)
}
