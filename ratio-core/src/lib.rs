//! Ratio Core — price series, the pairwise ratio tournament, the series store
//! and the data providers that feed it.
//!
//! - Domain types (price series, asset kinds, ranking records)
//! - Simple moving average helper
//! - Ratio evaluator and round-robin tournament
//! - Series store with replace-by-key merge
//! - Providers (Massive/Polygon, CoinCap, CryptoCompare, synthetic), universe, names

pub mod data;
pub mod domain;
pub mod indicators;
pub mod ranking;
pub mod store;

pub use domain::{AssetKind, AssetRanking, PriceSeries, SeriesError};
pub use ranking::TournamentEngine;
pub use store::SeriesStore;
