//! Live provider wiring.
//!
//! Each upstream host gets its own HTTP client and circuit breaker, so a
//! host that keeps failing only stops fetches routed to that host. Ticker
//! name lookups use a separate Massive client and breaker from the price
//! fetches; a burst of 429s on names never blocks the series that follow.

use std::sync::Arc;

use ratio_core::data::{
    CircuitBreaker, CoinCapProvider, CryptoCompareProvider, DataError, HttpClient, NameSource,
    PolygonProvider,
};
use ratio_core::AssetKind;

use crate::config::RatioConfig;
use crate::orchestrator::ProviderSet;

pub struct LiveProviders {
    /// Stocks and ETFs to Massive, crypto to CoinCap, CryptoCompare symbols
    /// routed by override.
    pub series: ProviderSet,
    /// `None` without a Massive API key.
    pub names: Option<Arc<dyn NameSource>>,
}

fn client(config: &RatioConfig) -> Result<HttpClient, DataError> {
    HttpClient::new(&config.http_settings(), Arc::new(CircuitBreaker::default()))
}

pub fn live_providers(config: &RatioConfig) -> Result<LiveProviders, DataError> {
    let p = &config.providers;
    let massive = Arc::new(PolygonProvider::new(client(config)?, &p.polygon_url, &p.polygon_api_key));
    let coincap = Arc::new(CoinCapProvider::new(client(config)?, &p.coincap_url));
    let cryptocompare = Arc::new(
        CryptoCompareProvider::new(client(config)?, &p.cryptocompare_url)
            .with_symbols(p.cryptocompare_symbols.iter().cloned()),
    );

    let mut series = ProviderSet::new()
        .with_kind(AssetKind::Stock, massive.clone())
        .with_kind(AssetKind::Etf, massive)
        .with_kind(AssetKind::Crypto, coincap);
    for symbol in cryptocompare.symbols() {
        series = series.with_override(symbol, cryptocompare.clone());
    }

    let names = if p.polygon_api_key.trim().is_empty() {
        None
    } else {
        let source: Arc<dyn NameSource> = Arc::new(PolygonProvider::new(
            client(config)?,
            &p.polygon_url,
            &p.polygon_api_key,
        ));
        Some(source)
    };

    Ok(LiveProviders { series, names })
}
