//! Domain types for the ranking engine

pub mod asset;
pub mod series;

pub use asset::{AssetKind, AssetRanking};
pub use series::{PriceSeries, SeriesError};
