//! Display-name lookup with a persistent JSON cache.
//!
//! Resolution order: cached name, built-in crypto name, the symbol itself.
//! Missing names are filled best-effort from a [`NameSource`] during
//! [`NameBook::refresh`]; lookups never block on the network.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::provider::NameSource;
use crate::domain::AssetKind;

const CRYPTO_NAMES: &[(&str, &str)] = &[
    ("BTC", "Bitcoin"),
    ("ETH", "Ethereum"),
    ("BNB", "Binance Coin"),
    ("SOL", "Solana"),
    ("XRP", "XRP"),
    ("ADA", "Cardano"),
    ("AVAX", "Avalanche"),
    ("DOT", "Polkadot"),
    ("MATIC", "Polygon"),
    ("LINK", "Chainlink"),
    ("UNI", "Uniswap"),
    ("ATOM", "Cosmos"),
    ("DOGE", "Dogecoin"),
    ("SHIB", "Shiba Inu"),
];

pub fn builtin_name(symbol: &str) -> Option<&'static str> {
    CRYPTO_NAMES
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone, Default)]
pub struct NameBook {
    names: BTreeMap<String, String>,
    path: Option<PathBuf>,
}

impl NameBook {
    /// In-memory book with no backing file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`. A missing or unreadable cache yields an empty book
    /// that will still save back to `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let names = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(names) => {
                    info!(count = names.len(), path = %path.display(), "loaded asset names");
                    names
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring unreadable name cache");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self {
            names,
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, name: impl Into<String>) {
        self.names.insert(symbol.into(), name.into());
    }

    pub fn cached(&self, symbol: &str) -> Option<&str> {
        self.names.get(symbol).map(|s| s.as_str())
    }

    /// Best-effort display name; never fails.
    pub fn lookup_name(&self, symbol: &str, kind: AssetKind) -> String {
        if let Some(name) = self.cached(symbol) {
            return name.to_string();
        }
        if kind == AssetKind::Crypto {
            if let Some(name) = builtin_name(symbol) {
                return name.to_string();
            }
        }
        symbol.to_string()
    }

    /// Fetch names for symbols that have neither a cached nor a built-in
    /// name, then save. Returns how many names were added.
    pub fn refresh<'a, I>(&mut self, symbols: I, source: &dyn NameSource) -> usize
    where
        I: IntoIterator<Item = (&'a str, AssetKind)>,
    {
        let missing: Vec<(&str, AssetKind)> = symbols
            .into_iter()
            .filter(|(s, kind)| {
                !self.names.contains_key(*s)
                    && !(*kind == AssetKind::Crypto && builtin_name(s).is_some())
            })
            .collect();
        if missing.is_empty() {
            return 0;
        }

        info!(count = missing.len(), "fetching asset names");
        let mut added = 0;
        for (symbol, kind) in missing {
            if let Some(name) = source.fetch_name(symbol, kind) {
                debug!(symbol, name = %name, "resolved name");
                self.names.insert(symbol.to_string(), name);
                added += 1;
            }
        }
        if added > 0 {
            if let Err(e) = self.save() {
                warn!(error = %e, "failed to save name cache");
            }
        }
        added
    }

    /// Write the cache as pretty JSON. No-op for an in-memory book.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.names)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedNames {
        calls: AtomicUsize,
    }

    impl NameSource for FixedNames {
        fn fetch_name(&self, symbol: &str, _kind: AssetKind) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match symbol {
                "AAPL" => Some("Apple Inc.".into()),
                "SPY" => Some("SPDR S&P 500 ETF Trust".into()),
                _ => None,
            }
        }
    }

    #[test]
    fn lookup_order() {
        let mut book = NameBook::new();
        assert_eq!(book.lookup_name("BTC", AssetKind::Crypto), "Bitcoin");
        assert_eq!(book.lookup_name("AAPL", AssetKind::Stock), "AAPL");
        book.insert("AAPL", "Apple Inc.");
        book.insert("BTC", "Bitcoin (cached)");
        assert_eq!(book.lookup_name("AAPL", AssetKind::Stock), "Apple Inc.");
        assert_eq!(book.lookup_name("BTC", AssetKind::Crypto), "Bitcoin (cached)");
    }

    #[test]
    fn refresh_fetches_only_missing_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asset_names.json");
        let source = FixedNames {
            calls: AtomicUsize::new(0),
        };

        let mut book = NameBook::open(&path);
        assert!(book.is_empty());
        let added = book.refresh(
            vec![
                ("AAPL", AssetKind::Stock),
                ("SPY", AssetKind::Etf),
                ("BTC", AssetKind::Crypto),
                ("ZZZ", AssetKind::Stock),
            ],
            &source,
        );
        assert_eq!(added, 2);
        // BTC has a built-in name and is not fetched.
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        let reopened = NameBook::open(&path);
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.cached("SPY"), Some("SPDR S&P 500 ETF Trust"));

        let mut reopened = reopened;
        assert_eq!(reopened.refresh(vec![("AAPL", AssetKind::Stock)], &source), 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn corrupt_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.json");
        std::fs::write(&path, "not json").unwrap();
        let book = NameBook::open(&path);
        assert!(book.is_empty());
        assert_eq!(book.path(), Some(path.as_path()));
    }
}
