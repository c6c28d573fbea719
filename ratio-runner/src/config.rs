//! Runtime configuration loaded from TOML with environment overrides.
//!
//! ```toml
//! [ranking]
//! window = 20
//! min_eligible = 10
//! top_crypto = 20
//! parallel = true
//!
//! [fetch]
//! periods = 0          # 0 → same as window
//! batch_size = 10
//! batch_delay_ms = 500
//!
//! [paths]
//! snapshot = "data_cache.json"
//! names = "asset_names.json"
//!
//! [schedule]
//! daily_at = "02:00"   # UTC
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ratio_core::data::{coincap, cryptocompare, polygon, HttpSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingSection {
    /// Moving-average window, in periods (weeks).
    pub window: usize,
    /// Eligible series required for an update to publish.
    pub min_eligible: usize,
    /// Crypto admitted to the big board.
    pub top_crypto: usize,
    pub parallel: bool,
}

impl Default for RankingSection {
    fn default() -> Self {
        Self {
            window: 20,
            min_eligible: 10,
            top_crypto: 20,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub periods: usize,
    /// Symbols fetched between pacing pauses.
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// First retry backoff; doubles on each further attempt.
    pub retry_delay_ms: u64,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            periods: 0,
            batch_size: 10,
            batch_delay_ms: 500,
            timeout_secs: 15,
            max_retries: 3,
            retry_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub snapshot: PathBuf,
    pub names: PathBuf,
    pub universe: Option<PathBuf>,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from("data_cache.json"),
            names: PathBuf::from("asset_names.json"),
            universe: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersSection {
    pub polygon_url: String,
    pub polygon_api_key: String,
    pub coincap_url: String,
    pub cryptocompare_url: String,
    /// Crypto symbols routed to CryptoCompare instead of CoinCap.
    pub cryptocompare_symbols: Vec<String>,
}

impl Default for ProvidersSection {
    fn default() -> Self {
        Self {
            polygon_url: polygon::DEFAULT_BASE_URL.into(),
            polygon_api_key: String::new(),
            coincap_url: coincap::DEFAULT_BASE_URL.into(),
            cryptocompare_url: cryptocompare::DEFAULT_BASE_URL.into(),
            cryptocompare_symbols: cryptocompare::DEFAULT_SYMBOLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    /// Daily run time, `HH:MM` UTC.
    pub daily_at: String,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            daily_at: "02:00".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioConfig {
    pub ranking: RankingSection,
    pub fetch: FetchSection,
    pub paths: PathsSection,
    pub providers: ProvidersSection,
    pub schedule: ScheduleSection,
}

impl RatioConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// File (if given) → environment overrides → validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Io {
                    path: p.display().to_string(),
                    source,
                })?;
                toml::from_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MASSIVE_API_KEY`, `RATIO_SNAPSHOT` and `RATIO_WINDOW`.
    pub fn apply_env<F>(&mut self, get: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = get("MASSIVE_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.providers.polygon_api_key = key.trim().to_string();
        }
        if let Some(path) = get("RATIO_SNAPSHOT").filter(|v| !v.trim().is_empty()) {
            self.paths.snapshot = PathBuf::from(path.trim());
        }
        if let Some(window) = get("RATIO_WINDOW") {
            self.ranking.window = window
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("RATIO_WINDOW '{window}' is not a number")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ranking.window == 0 {
            return Err(ConfigError::Invalid("ranking.window must be at least 1".into()));
        }
        if self.ranking.min_eligible == 0 {
            return Err(ConfigError::Invalid(
                "ranking.min_eligible must be at least 1".into(),
            ));
        }
        if self.fetch.periods != 0 && self.fetch.periods < self.ranking.window {
            return Err(ConfigError::Invalid(format!(
                "fetch.periods ({}) is shorter than ranking.window ({}); nothing would be eligible",
                self.fetch.periods, self.ranking.window
            )));
        }
        self.daily_at()?;
        Ok(())
    }

    /// Periods requested per symbol.
    pub fn periods(&self) -> usize {
        if self.fetch.periods == 0 {
            self.ranking.window
        } else {
            self.fetch.periods
        }
    }

    pub fn daily_at(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(self.schedule.daily_at.trim(), "%H:%M").map_err(|_| {
            ConfigError::Invalid(format!(
                "schedule.daily_at '{}' is not HH:MM",
                self.schedule.daily_at
            ))
        })
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch.batch_delay_ms)
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.fetch.timeout_secs.max(1)),
            max_retries: self.fetch.max_retries,
            base_delay: Duration::from_millis(self.fetch.retry_delay_ms),
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
