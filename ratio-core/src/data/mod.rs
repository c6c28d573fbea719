//! Price data acquisition: provider trait, HTTP-backed providers, the
//! synthetic provider, the symbol universe and display names.

pub mod circuit_breaker;
pub mod coincap;
pub mod cryptocompare;
pub mod http;
pub mod names;
pub mod polygon;
pub mod provider;
pub mod resample;
pub mod synthetic;
pub mod universe;

pub use circuit_breaker::CircuitBreaker;
pub use coincap::CoinCapProvider;
pub use cryptocompare::CryptoCompareProvider;
pub use http::{HttpClient, HttpSettings};
pub use names::NameBook;
pub use polygon::PolygonProvider;
pub use provider::{DataError, NameSource, SeriesProvider};
pub use resample::weekly_closes;
pub use synthetic::SyntheticProvider;
pub use universe::{AssetUniverse, UniverseError};
