//! CoinCap provider for crypto.
//!
//! CoinCap serves daily history keyed by its own asset ids (`bitcoin`,
//! `binance-coin`, ...), oldest first, with prices as decimal strings.
//! Daily closes are sampled down to weekly.

use chrono::Utc;
use serde::Deserialize;

use super::http::HttpClient;
use super::provider::{DataError, SeriesProvider};
use super::resample::{days_for_weeks, weekly_closes};
use crate::domain::PriceSeries;

pub const DEFAULT_BASE_URL: &str = "https://api.coincap.io/v2";

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Ticker → CoinCap asset id for symbols whose id is not the lower-cased ticker.
const ASSET_IDS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("BNB", "binance-coin"),
    ("SOL", "solana"),
    ("XRP", "ripple"),
    ("ADA", "cardano"),
    ("AVAX", "avalanche"),
    ("DOT", "polkadot"),
    ("MATIC", "polygon"),
    ("LINK", "chainlink"),
    ("UNI", "uniswap"),
    ("ATOM", "cosmos"),
    ("ALGO", "algorand"),
    ("VET", "vechain"),
    ("FTM", "fantom"),
    ("NEAR", "near-protocol"),
    ("HBAR", "hedera-hashgraph"),
    ("ICP", "internet-computer"),
    ("APT", "aptos"),
    ("ARB", "arbitrum"),
    ("DOGE", "dogecoin"),
    ("SHIB", "shiba-inu"),
    ("PEPE", "pepe"),
    ("WIF", "dogwifhat"),
    ("BONK", "bonk"),
];

pub fn asset_id(symbol: &str) -> String {
    ASSET_IDS
        .iter()
        .find(|(ticker, _)| ticker.eq_ignore_ascii_case(symbol))
        .map(|(_, id)| (*id).to_string())
        .unwrap_or_else(|| symbol.to_ascii_lowercase())
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default)]
    data: Option<Vec<HistoryPoint>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryPoint {
    price_usd: String,
}

pub struct CoinCapProvider {
    http: HttpClient,
    base_url: String,
}

impl CoinCapProvider {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn history_url(&self, symbol: &str, periods: usize, now_ms: i64) -> String {
        let start_ms = now_ms - days_for_weeks(periods) as i64 * MS_PER_DAY;
        format!(
            "{}/assets/{}/history?interval=d1&start={start_ms}&end={now_ms}",
            self.base_url,
            asset_id(symbol)
        )
    }
}

/// Weekly closes (most recent first) from a daily history payload.
pub(crate) fn parse_history(
    symbol: &str,
    resp: HistoryResponse,
    periods: usize,
) -> Result<Vec<f64>, DataError> {
    if let Some(err) = resp.error {
        return Err(DataError::Provider(err));
    }
    let points = match resp.data {
        Some(points) if !points.is_empty() => points,
        _ => {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
    };

    let daily = points
        .iter()
        .map(|p| {
            p.price_usd.trim().parse::<f64>().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "bad priceUsd '{}' for {symbol}: {e}",
                    p.price_usd
                ))
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;

    let mut weekly = weekly_closes(&daily);
    weekly.truncate(periods);
    Ok(weekly)
}

impl SeriesProvider for CoinCapProvider {
    fn name(&self) -> &str {
        "coincap"
    }

    fn fetch_series(&self, symbol: &str, periods: usize) -> Result<PriceSeries, DataError> {
        let url = self.history_url(symbol, periods, Utc::now().timestamp_millis());
        let resp: HistoryResponse = self.http.get_json(&url, symbol)?;
        let prices = parse_history(symbol, resp, periods)?;
        Ok(PriceSeries::new(symbol, prices))
    }

    fn is_available(&self) -> bool {
        self.http.breaker().is_allowed()
    }
}
