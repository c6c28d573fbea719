//! Series provider trait and structured data errors.
//!
//! A provider answers one question: "give me the latest `periods` closes for
//! this symbol, most recent first". Caching, merging and ranking all sit
//! above this trait, so providers can be swapped or mocked freely.

use thiserror::Error;

use crate::domain::{AssetKind, PriceSeries};

/// Failures raised by providers and the HTTP layer under them.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("{provider} does not handle symbol '{symbol}'")]
    Unsupported { provider: String, symbol: String },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// True when the symbol itself is unknown rather than the fetch failing.
    pub fn is_unknown_symbol(&self) -> bool {
        matches!(self, DataError::SymbolNotFound { .. } | DataError::Unsupported { .. })
    }
}

/// Fetches periodic closing prices for one asset class.
pub trait SeriesProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Latest `periods` closes for `symbol`, most recent first. May return
    /// fewer than `periods` when the provider has less history.
    fn fetch_series(&self, symbol: &str, periods: usize) -> Result<PriceSeries, DataError>;

    /// False while the provider is refusing requests (breaker open, etc).
    fn is_available(&self) -> bool {
        true
    }
}

/// Best-effort display-name source.
pub trait NameSource: Send + Sync {
    fn fetch_name(&self, symbol: &str, kind: AssetKind) -> Option<String>;
}
