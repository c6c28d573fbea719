//! CryptoCompare provider for coins CoinCap covers poorly.
//!
//! Only a fixed symbol set is served; anything else is rejected before a
//! request is made. Daily `histoday` closes are sampled down to weekly after
//! dropping non-positive closes (the endpoint pads pre-listing days with 0).

use chrono::Utc;
use serde::Deserialize;

use super::http::HttpClient;
use super::provider::{DataError, SeriesProvider};
use super::resample::{days_for_weeks, weekly_closes};
use crate::domain::PriceSeries;

pub const DEFAULT_BASE_URL: &str = "https://min-api.cryptocompare.com/data/v2";

pub const DEFAULT_SYMBOLS: &[&str] = &[
    "BNB", "TRX", "TON", "HBAR", "VET", "FTM", "ARB", "OP", "PEPE", "WIF", "BONK",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct HistodayResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<HistodayData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HistodayData {
    #[serde(default)]
    data: Vec<HistodayBar>,
}

#[derive(Debug, Deserialize)]
struct HistodayBar {
    close: f64,
}

pub struct CryptoCompareProvider {
    http: HttpClient,
    base_url: String,
    symbols: Vec<String>,
}

impl CryptoCompareProvider {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_symbols(mut self, symbols: impl IntoIterator<Item = String>) -> Self {
        self.symbols = symbols.into_iter().map(|s| s.to_ascii_uppercase()).collect();
        self
    }

    /// Symbols this provider will serve.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn handles(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s.eq_ignore_ascii_case(symbol))
    }

    pub(crate) fn histoday_url(&self, symbol: &str, periods: usize, now_secs: i64) -> String {
        format!(
            "{}/histoday?fsym={symbol}&tsym=USD&limit={}&toTs={now_secs}",
            self.base_url,
            days_for_weeks(periods)
        )
    }
}

pub(crate) fn parse_histoday(
    symbol: &str,
    resp: HistodayResponse,
    periods: usize,
) -> Result<Vec<f64>, DataError> {
    if resp.response.as_deref() == Some("Error") {
        return Err(DataError::Provider(
            resp.message.unwrap_or_else(|| "unknown error".into()),
        ));
    }
    let bars = resp.data.map(|d| d.data).unwrap_or_default();
    let daily: Vec<f64> = bars.into_iter().map(|b| b.close).filter(|c| *c > 0.0).collect();
    if daily.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }
    let mut weekly = weekly_closes(&daily);
    weekly.truncate(periods);
    Ok(weekly)
}

impl SeriesProvider for CryptoCompareProvider {
    fn name(&self) -> &str {
        "cryptocompare"
    }

    fn fetch_series(&self, symbol: &str, periods: usize) -> Result<PriceSeries, DataError> {
        if !self.handles(symbol) {
            return Err(DataError::Unsupported {
                provider: self.name().to_string(),
                symbol: symbol.to_string(),
            });
        }
        let url = self.histoday_url(symbol, periods, Utc::now().timestamp());
        let resp: HistodayResponse = self.http.get_json(&url, symbol)?;
        let prices = parse_histoday(symbol, resp, periods)?;
        Ok(PriceSeries::new(symbol, prices))
    }

    fn is_available(&self) -> bool {
        self.http.breaker().is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::circuit_breaker::CircuitBreaker;
    use crate::data::http::HttpSettings;
    use std::sync::Arc;

    fn provider() -> CryptoCompareProvider {
        let http = HttpClient::new(&HttpSettings::default(), Arc::new(CircuitBreaker::default())).unwrap();
        CryptoCompareProvider::new(http, DEFAULT_BASE_URL)
    }

    #[test]
    fn url_shape() {
        assert_eq!(
            provider().histoday_url("BNB", 20, 1_700_000_000),
            "https://min-api.cryptocompare.com/data/v2/histoday?fsym=BNB&tsym=USD&limit=170&toTs=1700000000"
        );
    }

    #[test]
    fn unsupported_symbol_rejected_locally() {
        let err = provider().fetch_series("BTC", 20).unwrap_err();
        assert!(matches!(err, DataError::Unsupported { .. }));
        assert!(provider().handles("pepe"));
    }

    #[test]
    fn custom_symbol_set() {
        let p = provider().with_symbols(vec!["sui".to_string()]);
        assert!(p.handles("SUI"));
        assert!(!p.handles("BNB"));
    }

    #[test]
    fn drops_zero_closes_then_samples() {
        let mut closes = vec!["0".to_string(); 3];
        closes.extend((1..=8).map(|d| d.to_string()));
        let bars: Vec<String> = closes.iter().map(|c| format!(r#"{{"close":{c}}}"#)).collect();
        let json = format!(
            r#"{{"Response":"Success","Data":{{"Aggregated":false,"Data":[{}]}}}}"#,
            bars.join(",")
        );
        let resp: HistodayResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parse_histoday("BNB", resp, 20).unwrap(), vec![8.0, 1.0]);
    }

    #[test]
    fn error_response_surfaces_message() {
        let resp: HistodayResponse = serde_json::from_str(
            r#"{"Response":"Error","Message":"fsym param is invalid","Data":{}}"#,
        )
        .unwrap();
        assert!(matches!(
            parse_histoday("BNB", resp, 20),
            Err(DataError::Provider(msg)) if msg.contains("fsym")
        ));
    }
}
