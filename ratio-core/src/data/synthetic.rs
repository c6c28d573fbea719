//! Deterministic synthetic weekly closes for offline runs and tests.
//!
//! Each symbol gets its own random walk seeded from a BLAKE3 hash of the
//! symbol (plus an optional salt), so the same symbol always yields the same
//! series. Synthetic data is for development only.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, SeriesProvider};
use crate::domain::PriceSeries;

#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider {
    salt: String,
    /// Maximum absolute weekly return.
    volatility: Option<f64>,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change every generated series without losing determinism.
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = salt.into();
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = Some(volatility.abs().min(0.5));
        self
    }

    fn rng_for(&self, symbol: &str) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(symbol.as_bytes());
        hasher.update(self.salt.as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    /// Most-recent-first weekly closes.
    pub fn generate(&self, symbol: &str, periods: usize) -> Vec<f64> {
        let mut rng = self.rng_for(symbol);
        let volatility = self.volatility.unwrap_or(0.06);

        let mut price: f64 = rng.gen_range(5.0..500.0);
        let drift: f64 = rng.gen_range(-0.01..0.01);
        let mut oldest_first = Vec::with_capacity(periods);
        for _ in 0..periods {
            let weekly_return = drift + rng.gen_range(-volatility..=volatility);
            price = (price * (1.0 + weekly_return)).max(0.01);
            oldest_first.push(price);
        }
        oldest_first.reverse();
        oldest_first
    }
}

impl SeriesProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_series(&self, symbol: &str, periods: usize) -> Result<PriceSeries, DataError> {
        if symbol.trim().is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(PriceSeries::new(symbol, self.generate(symbol, periods)))
    }
}
