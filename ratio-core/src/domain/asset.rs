use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Asset class used for board composition and provider routing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    #[default]
    Stock,
    Etf,
    Crypto,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Stock, AssetKind::Etf, AssetKind::Crypto];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Stock => "stock",
            AssetKind::Etf => "etf",
            AssetKind::Crypto => "crypto",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    /// Accepts singular and plural forms (`stock`/`stocks`, `etf`/`etfs`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stock" | "stocks" => Ok(AssetKind::Stock),
            "etf" | "etfs" => Ok(AssetKind::Etf),
            "crypto" | "cryptos" => Ok(AssetKind::Crypto),
            other => Err(format!(
                "unknown asset type '{other}' (expected stocks, etfs or crypto)"
            )),
        }
    }
}

/// One ranked asset produced by a tournament pass.
///
/// Recomputed from scratch on every pass. `kind` and `name` start at their
/// defaults (stock, symbol) and are resolved by board composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRanking {
    pub symbol: String,
    pub wins: u32,
    pub losses: u32,
    pub total_matchups: u32,
    /// Percentage in [0, 100], one decimal.
    pub win_rate: f64,
    pub current_price: f64,
    #[serde(alias = "ma")]
    pub moving_average: f64,
    /// Signed deviation from the asset's own moving average, two decimals.
    pub percent_above_ma: f64,
    pub above_ma: bool,
    pub rank: usize,
    #[serde(rename = "type", default)]
    pub kind: AssetKind,
    #[serde(default)]
    pub name: String,
}
