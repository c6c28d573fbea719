//! Massive (formerly Polygon.io) provider for stocks and ETFs.
//!
//! Weekly aggregates come from `/v2/aggs/ticker/{sym}/range/1/week/{from}/{to}`
//! with split/dividend adjustment and descending sort, so the response is
//! already most-recent-first. Display names come from the ticker reference
//! endpoint.

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

use super::http::HttpClient;
use super::provider::{DataError, NameSource, SeriesProvider};
use crate::domain::{AssetKind, PriceSeries};

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Extra weeks requested beyond `periods` to absorb holidays and gaps.
const WEEK_BUFFER: usize = 10;

#[derive(Debug, Deserialize)]
pub(crate) struct AggregatesResponse {
    #[serde(default)]
    results: Option<Vec<AggregateBar>>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AggregateBar {
    /// Close.
    c: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TickerResponse {
    #[serde(default)]
    results: Option<TickerDetails>,
}

#[derive(Debug, Deserialize)]
struct TickerDetails {
    #[serde(default)]
    name: Option<String>,
}

pub struct PolygonProvider {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl PolygonProvider {
    pub fn new(http: HttpClient, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub(crate) fn aggregates_url(&self, symbol: &str, periods: usize, today: NaiveDate) -> String {
        let weeks = periods + WEEK_BUFFER;
        let start = today - ChronoDuration::weeks(weeks as i64);
        format!(
            "{}/v2/aggs/ticker/{symbol}/range/1/week/{}/{}\
             ?adjusted=true&sort=desc&limit={weeks}&apiKey={}",
            self.base_url,
            start.format("%Y-%m-%d"),
            today.format("%Y-%m-%d"),
            self.api_key
        )
    }

    pub(crate) fn reference_url(&self, symbol: &str) -> String {
        format!(
            "{}/v3/reference/tickers/{symbol}?apiKey={}",
            self.base_url, self.api_key
        )
    }

    fn require_key(&self) -> Result<(), DataError> {
        if self.api_key.trim().is_empty() {
            return Err(DataError::AuthenticationRequired(
                "MASSIVE_API_KEY is not set".into(),
            ));
        }
        Ok(())
    }
}

/// Closes from an aggregates payload, truncated to `periods`.
pub(crate) fn parse_aggregates(
    symbol: &str,
    resp: AggregatesResponse,
    periods: usize,
) -> Result<Vec<f64>, DataError> {
    if let Some(err) = resp.error {
        return Err(DataError::Provider(err));
    }
    match resp.results {
        Some(bars) if !bars.is_empty() => {
            Ok(bars.into_iter().take(periods).map(|b| b.c).collect())
        }
        _ => {
            debug!(symbol, status = ?resp.status, "aggregates response has no results");
            Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
    }
}

pub(crate) fn parse_ticker_name(resp: TickerResponse) -> Option<String> {
    resp.results
        .and_then(|r| r.name)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

impl SeriesProvider for PolygonProvider {
    fn name(&self) -> &str {
        "massive"
    }

    fn fetch_series(&self, symbol: &str, periods: usize) -> Result<PriceSeries, DataError> {
        self.require_key()?;
        let url = self.aggregates_url(symbol, periods, Utc::now().date_naive());
        let resp: AggregatesResponse = self.http.get_json(&url, symbol)?;
        let prices = parse_aggregates(symbol, resp, periods)?;
        Ok(PriceSeries::new(symbol, prices))
    }

    fn is_available(&self) -> bool {
        self.http.breaker().is_allowed()
    }
}

impl NameSource for PolygonProvider {
    fn fetch_name(&self, symbol: &str, kind: AssetKind) -> Option<String> {
        if kind == AssetKind::Crypto || self.require_key().is_err() {
            return None;
        }
        let resp: TickerResponse = self.http.get_json(&self.reference_url(symbol), symbol).ok()?;
        parse_ticker_name(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::circuit_breaker::CircuitBreaker;
    use crate::data::http::HttpSettings;
    use std::sync::Arc;

    fn provider(key: &str) -> PolygonProvider {
        let http = HttpClient::new(&HttpSettings::default(), Arc::new(CircuitBreaker::default())).unwrap();
        PolygonProvider::new(http, "https://api.polygon.io/", key)
    }

    #[test]
    fn aggregates_url_shape() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let url = provider("KEY").aggregates_url("AAPL", 20, today);
        assert_eq!(
            url,
            "https://api.polygon.io/v2/aggs/ticker/AAPL/range/1/week/2023-12-01/2024-06-28\
             ?adjusted=true&sort=desc&limit=30&apiKey=KEY"
        );
    }

    #[test]
    fn reference_url_shape() {
        assert_eq!(
            provider("KEY").reference_url("SPY"),
            "https://api.polygon.io/v3/reference/tickers/SPY?apiKey=KEY"
        );
    }

    #[test]
    fn parses_closes_in_response_order() {
        let json = r#"{"status":"OK","results":[{"c":190.5,"o":1.0},{"c":185.0},{"c":180.25}]}"#;
        let resp: AggregatesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parse_aggregates("AAPL", resp, 2).unwrap(), vec![190.5, 185.0]);
    }

    #[test]
    fn empty_results_is_symbol_not_found() {
        let resp: AggregatesResponse =
            serde_json::from_str(r#"{"status":"OK","resultsCount":0}"#).unwrap();
        let err = parse_aggregates("NOPE", resp, 20).unwrap_err();
        assert!(err.is_unknown_symbol());
    }

    #[test]
    fn error_payload_is_provider_error() {
        let resp: AggregatesResponse =
            serde_json::from_str(r#"{"status":"ERROR","error":"bad key"}"#).unwrap();
        assert!(matches!(
            parse_aggregates("AAPL", resp, 20),
            Err(DataError::Provider(msg)) if msg == "bad key"
        ));
    }

    #[test]
    fn ticker_name_parsing() {
        let resp: TickerResponse =
            serde_json::from_str(r#"{"results":{"ticker":"AAPL","name":"Apple Inc."}}"#).unwrap();
        assert_eq!(parse_ticker_name(resp).as_deref(), Some("Apple Inc."));
        let resp: TickerResponse = serde_json::from_str(r#"{"status":"NOT_FOUND"}"#).unwrap();
        assert_eq!(parse_ticker_name(resp), None);
    }

    #[test]
    fn missing_key_fails_without_network() {
        let err = provider("").fetch_series("AAPL", 20).unwrap_err();
        assert!(matches!(err, DataError::AuthenticationRequired(_)));
        assert_eq!(provider("").fetch_name("AAPL", AssetKind::Stock), None);
    }
}
