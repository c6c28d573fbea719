//! Authoritative symbol → price series mapping.
//!
//! Mutation goes through `put`, `merge` and `remove` only. `merge` is a
//! replace-by-key union: symbols present in the partial replace their old
//! series wholesale; every other symbol is left exactly as it was.
//!
//! Serialized as a plain JSON object `{ "AAPL": [180.0, 175.0, ...], ... }`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<f64>>", into = "BTreeMap<String, Vec<f64>>")]
pub struct SeriesStore {
    series: BTreeMap<String, PriceSeries>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored series, ordered by symbol.
    pub fn get_all(&self) -> &BTreeMap<String, PriceSeries> {
        &self.series
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.series.contains_key(symbol)
    }

    /// Insert or fully replace the series for its symbol. Returns the old one.
    pub fn put(&mut self, series: PriceSeries) -> Option<PriceSeries> {
        self.series.insert(series.symbol.clone(), series)
    }

    /// Replace-by-key union. Returns the number of symbols written.
    pub fn merge<I>(&mut self, partial: I) -> usize
    where
        I: IntoIterator<Item = PriceSeries>,
    {
        let mut written = 0;
        for series in partial {
            self.put(series);
            written += 1;
        }
        written
    }

    pub fn remove(&mut self, symbol: &str) -> Option<PriceSeries> {
        self.series.remove(symbol)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|s| s.as_str())
    }

    /// Series with at least `window` prices, in symbol order.
    pub fn eligible(&self, window: usize) -> Vec<&PriceSeries> {
        self.series
            .values()
            .filter(|s| s.is_eligible(window))
            .collect()
    }

    pub fn eligible_count(&self, window: usize) -> usize {
        self.series.values().filter(|s| s.is_eligible(window)).count()
    }

    /// Deterministic BLAKE3 hash over every symbol and price, in symbol order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (symbol, series) in &self.series {
            hasher.update(symbol.as_bytes());
            hasher.update(&(series.prices.len() as u64).to_le_bytes());
            for price in &series.prices {
                hasher.update(&price.to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

impl From<BTreeMap<String, Vec<f64>>> for SeriesStore {
    fn from(map: BTreeMap<String, Vec<f64>>) -> Self {
        map.into_iter()
            .map(|(symbol, prices)| PriceSeries::new(symbol, prices))
            .collect()
    }
}

impl From<SeriesStore> for BTreeMap<String, Vec<f64>> {
    fn from(store: SeriesStore) -> Self {
        store
            .series
            .into_iter()
            .map(|(symbol, series)| (symbol, series.prices))
            .collect()
    }
}

impl FromIterator<PriceSeries> for SeriesStore {
    fn from_iter<T: IntoIterator<Item = PriceSeries>>(iter: T) -> Self {
        let mut store = SeriesStore::new();
        store.merge(iter);
        store
    }
}

impl IntoIterator for SeriesStore {
    type Item = PriceSeries;
    type IntoIter = std::collections::btree_map::IntoValues<String, PriceSeries>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(symbol: &str, n: usize, level: f64) -> PriceSeries {
        PriceSeries::new(symbol, vec![level; n])
    }

    #[test]
    fn put_replaces_whole_series() {
        let mut store = SeriesStore::new();
        store.put(series("AAPL", 20, 1.0));
        let old = store.put(series("AAPL", 5, 2.0)).unwrap();
        assert_eq!(old.len(), 20);
        assert_eq!(store.get("AAPL").unwrap().prices, vec![2.0; 5]);
    }

    #[test]
    fn merge_leaves_other_symbols_untouched() {
        let mut store: SeriesStore =
            vec![series("AAPL", 20, 1.0), series("MSFT", 20, 2.0)].into_iter().collect();
        let before_msft = store.get("MSFT").cloned();

        let written = store.merge(vec![series("AAPL", 20, 3.0), series("BTC", 20, 4.0)]);

        assert_eq!(written, 2);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get("AAPL").unwrap().prices[0], 3.0);
        assert_eq!(store.get("MSFT").cloned(), before_msft);
    }

    #[test]
    fn remove_drops_symbol() {
        let mut store: SeriesStore = vec![series("AAPL", 20, 1.0)].into_iter().collect();
        assert!(store.remove("AAPL").is_some());
        assert!(store.remove("AAPL").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn eligible_filters_by_window() {
        let store: SeriesStore = vec![
            series("AAPL", 20, 1.0),
            series("MSFT", 19, 1.0),
            series("GOOGL", 30, 1.0),
        ]
        .into_iter()
        .collect();
        let eligible: Vec<&str> = store.eligible(20).iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(eligible, vec!["AAPL", "GOOGL"]);
        assert_eq!(store.eligible_count(20), 2);
    }

    #[test]
    fn serializes_as_plain_map() {
        let store: SeriesStore = vec![PriceSeries::new("BTC", vec![2.0, 1.0])].into_iter().collect();
        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"{"BTC":[2.0,1.0]}"#);
        let back: SeriesStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a: SeriesStore = vec![series("AAPL", 20, 1.0)].into_iter().collect();
        let b: SeriesStore = vec![series("AAPL", 20, 1.0)].into_iter().collect();
        let c: SeriesStore = vec![series("AAPL", 20, 1.5)].into_iter().collect();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
