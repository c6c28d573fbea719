//! Periodic closing-price series.
//!
//! Prices are stored most-recent-first: `prices[0]` is the latest close,
//! `prices[1]` the close one period earlier, and so on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failures for a fetched or imported price series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("series for '{symbol}' is empty")]
    Empty { symbol: String },

    #[error("series for '{symbol}' has a non-finite price at period {index}")]
    NonFinite { symbol: String, index: usize },

    #[error("series for '{symbol}' has a negative price at period {index}")]
    Negative { symbol: String, index: usize },
}

/// Ordered closing prices for one symbol, most recent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub prices: Vec<f64>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, prices: Vec<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            prices,
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Most recent close.
    pub fn latest(&self) -> Option<f64> {
        self.prices.first().copied()
    }

    /// A series takes part in a tournament only with at least `window` periods.
    pub fn is_eligible(&self, window: usize) -> bool {
        window > 0 && self.prices.len() >= window
    }

    /// Keep only the most recent `periods` closes.
    pub fn truncate(&mut self, periods: usize) {
        self.prices.truncate(periods);
    }

    /// Reject empty series and NaN/infinite/negative prices.
    ///
    /// Zero is allowed through: a zero close is a degenerate but legal data
    /// point, and the ratio evaluator has its own policy for it.
    pub fn validate(&self) -> Result<(), SeriesError> {
        if self.prices.is_empty() {
            return Err(SeriesError::Empty {
                symbol: self.symbol.clone(),
            });
        }
        for (index, &p) in self.prices.iter().enumerate() {
            if !p.is_finite() {
                return Err(SeriesError::NonFinite {
                    symbol: self.symbol.clone(),
                    index,
                });
            }
            if p < 0.0 {
                return Err(SeriesError::Negative {
                    symbol: self.symbol.clone(),
                    index,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligibility_requires_full_window() {
        let s = PriceSeries::new("AAPL", vec![1.0; 19]);
        assert!(!s.is_eligible(20));
        assert!(s.is_eligible(19));
        assert!(!s.is_eligible(0));
    }

    #[test]
    fn latest_is_first_element() {
        let s = PriceSeries::new("AAPL", vec![3.0, 2.0, 1.0]);
        assert_eq!(s.latest(), Some(3.0));
        assert_eq!(PriceSeries::new("X", vec![]).latest(), None);
    }

    #[test]
    fn truncate_keeps_most_recent() {
        let mut s = PriceSeries::new("AAPL", vec![5.0, 4.0, 3.0, 2.0]);
        s.truncate(2);
        assert_eq!(s.prices, vec![5.0, 4.0]);
    }

    #[test]
    fn validate_rejects_bad_prices() {
        assert!(PriceSeries::new("A", vec![]).validate().is_err());
        assert_eq!(
            PriceSeries::new("A", vec![1.0, f64::NAN]).validate(),
            Err(SeriesError::NonFinite {
                symbol: "A".into(),
                index: 1
            })
        );
        assert_eq!(
            PriceSeries::new("A", vec![-1.0]).validate(),
            Err(SeriesError::Negative {
                symbol: "A".into(),
                index: 0
            })
        );
        assert!(PriceSeries::new("A", vec![1.0, 0.0]).validate().is_ok());
    }
}
