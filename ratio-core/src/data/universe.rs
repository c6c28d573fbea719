//! Known-symbol lists per asset class.
//!
//! The universe is a TOML document with three lists:
//!
//! ```toml
//! stocks = ["AAPL", "MSFT"]
//! etfs = ["SPY", "GLD"]
//! crypto = ["BTC", "ETH"]
//! ```
//!
//! It doubles as the classification used for board composition: crypto
//! membership wins over ETF, ETF over stock, and unknown symbols are stocks.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::AssetKind;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read universe file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse universe TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize universe: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetUniverse {
    pub stocks: Vec<String>,
    pub etfs: Vec<String>,
    pub crypto: Vec<String>,
}

impl AssetUniverse {
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path).map_err(|source| UniverseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        let mut universe: Self = toml::from_str(content)?;
        universe.normalize();
        Ok(universe)
    }

    pub fn to_toml(&self) -> Result<String, UniverseError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Upper-case every symbol and drop duplicates within each list,
    /// keeping first-seen order.
    fn normalize(&mut self) {
        for list in [&mut self.stocks, &mut self.etfs, &mut self.crypto] {
            let mut seen = BTreeSet::new();
            list.retain_mut(|s| {
                *s = s.trim().to_ascii_uppercase();
                !s.is_empty() && seen.insert(s.clone())
            });
        }
    }

    /// Symbols configured for one asset class.
    pub fn known_symbols(&self, kind: AssetKind) -> &[String] {
        match kind {
            AssetKind::Stock => &self.stocks,
            AssetKind::Etf => &self.etfs,
            AssetKind::Crypto => &self.crypto,
        }
    }

    /// Every configured symbol with its class, in stock → ETF → crypto order.
    pub fn all(&self) -> impl Iterator<Item = (&str, AssetKind)> {
        AssetKind::ALL
            .into_iter()
            .flat_map(move |kind| self.known_symbols(kind).iter().map(move |s| (s.as_str(), kind)))
    }

    pub fn symbol_count(&self) -> usize {
        self.stocks.len() + self.etfs.len() + self.crypto.len()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        AssetKind::ALL
            .iter()
            .any(|k| self.known_symbols(*k).iter().any(|s| s.eq_ignore_ascii_case(symbol)))
    }

    /// First match wins: crypto, then ETF, then stock; default stock.
    pub fn classify(&self, symbol: &str) -> AssetKind {
        let member = |list: &[String]| list.iter().any(|s| s.eq_ignore_ascii_case(symbol));
        if member(&self.crypto) {
            AssetKind::Crypto
        } else if member(&self.etfs) {
            AssetKind::Etf
        } else {
            AssetKind::Stock
        }
    }

    /// Built-in lists: 20 large-cap stocks, 12 broad/sector/commodity ETFs
    /// and 20 major coins.
    pub fn default_lists() -> Self {
        fn owned(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            stocks: owned(&[
                "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "UNH", "JPM", "V", "XOM",
                "HD", "PG", "MA", "COST", "ABBV", "AVGO", "DIS", "NFLX", "AMD",
            ]),
            etfs: owned(&[
                "SPY", "QQQ", "DIA", "IWM", "XLE", "XLF", "XLK", "XLV", "GLD", "SLV", "USO", "UNG",
            ]),
            crypto: owned(&[
                "BTC", "ETH", "BNB", "SOL", "XRP", "ADA", "AVAX", "DOT", "MATIC", "LINK", "UNI",
                "ATOM", "DOGE", "SHIB", "ALGO", "VET", "FTM", "NEAR", "HBAR", "ICP",
            ]),
        }
    }
}
