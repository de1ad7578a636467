//! Configuration file handling with TOML support.

use crate::api::{MARKET_SYMBOLS, YAHOO_FINANCE_URL};
use crate::cli::Args;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Lower bound for the refresh timer.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    /// Market indices shown above the watchlist
    #[serde(default)]
    pub market: MarketConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub profile: ProfileConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Time between quote refreshes, e.g. "60s"
    #[serde(default = "default_refresh_interval", with = "duration_str")]
    pub refresh_interval: Duration,

    /// API timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Repeat "open in browser" presses inside this window are ignored
    #[serde(default = "default_browser_debounce", with = "duration_str")]
    pub browser_debounce: Duration,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            timeout: default_timeout(),
            browser_debounce: default_browser_debounce(),
        }
    }
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(60)
}
fn default_timeout() -> u64 {
    10
}
fn default_browser_debounce() -> Duration {
    Duration::from_millis(100)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "default_market_symbols")]
    pub symbols: Vec<String>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            symbols: default_market_symbols(),
        }
    }
}

fn default_market_symbols() -> Vec<String> {
    MARKET_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_quote_url")]
    pub quote_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            quote_url: default_quote_url(),
        }
    }
}

fn default_quote_url() -> String {
    YAHOO_FINANCE_URL.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Profile file location; defaults to the user config directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Durations as humantime strings ("60s", "1m 30s", "100ms").
mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(D::Error::custom)
    }
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load the file at the default location, or fall back to defaults when
    /// there is none. A file that exists but does not parse is an error.
    pub fn load_or_default() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tickerdash").join("config.toml"))
    }

    /// Command-line flags win over file settings.
    pub fn with_overrides(mut self, args: &Args) -> Self {
        if let Some(delay) = args.delay {
            self.general.refresh_interval = delay;
        }
        if let Some(path) = &args.profile {
            self.profile.path = Some(path.clone());
        }
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        self.general.refresh_interval.max(MIN_REFRESH_INTERVAL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.general.timeout)
    }
}

/// Generate a sample configuration file content.
pub fn sample_config() -> &'static str {
    r##"# tickerdash configuration file

[general]
# Time between quote refreshes (e.g. "30s", "2m")
refresh_interval = "60s"
# API timeout in seconds
timeout = 10
# Ignore repeated "open in browser" presses within this window
browser_debounce = "100ms"

[market]
# Indices shown in the market band
symbols = ["^DJI", "^GSPC", "^IXIC", "BTC-USD"]

[api]
quote_url = "https://query1.finance.yahoo.com/v7/finance/quote"

[profile]
# Watchlist and saved portfolios
# path = "/home/me/.config/tickerdash/profile.json"
"##
}
