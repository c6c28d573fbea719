//! Board composition: classify ranked assets and split them into the big
//! board and the crypto explorer.
//!
//! The big board holds every non-crypto asset plus the top-K crypto by
//! rank; the crypto explorer holds every crypto asset. Rank numbers carry
//! over from the tournament untouched, and both boards keep tournament order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use ratio_core::data::{AssetUniverse, NameBook};
use ratio_core::{AssetKind, AssetRanking};

/// Counts by type across the union of both boards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardMetadata {
    /// Older cache files call this `total_assets`.
    #[serde(alias = "total_assets")]
    pub total: usize,
    pub stocks: usize,
    pub etfs: usize,
    pub crypto: usize,
}

impl BoardMetadata {
    pub fn count(&self, kind: AssetKind) -> usize {
        match kind {
            AssetKind::Stock => self.stocks,
            AssetKind::Etf => self.etfs,
            AssetKind::Crypto => self.crypto,
        }
    }
}

/// Immutable result of one composition pass. Replaced wholesale, never
/// edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub big_board: Vec<AssetRanking>,
    pub crypto_explorer: Vec<AssetRanking>,
    pub last_update: DateTime<Utc>,
    pub metadata: BoardMetadata,
}

impl BoardSnapshot {
    /// Look a symbol up (case-insensitive) on the big board, then the crypto
    /// explorer.
    pub fn find(&self, symbol: &str) -> Option<&AssetRanking> {
        self.big_board
            .iter()
            .chain(&self.crypto_explorer)
            .find(|r| r.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Big board entries, optionally restricted to one kind, truncated to `limit`.
    pub fn big_board_view(&self, kind: Option<AssetKind>, limit: Option<usize>) -> Vec<AssetRanking> {
        self.big_board
            .iter()
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub fn crypto_view(&self, limit: Option<usize>) -> Vec<AssetRanking> {
        self.crypto_explorer
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

pub struct BoardComposer<'a> {
    universe: &'a AssetUniverse,
    names: &'a NameBook,
    top_crypto: usize,
}

impl<'a> BoardComposer<'a> {
    pub fn new(universe: &'a AssetUniverse, names: &'a NameBook, top_crypto: usize) -> Self {
        Self {
            universe,
            names,
            top_crypto,
        }
    }

    pub fn compose(&self, rankings: Vec<AssetRanking>) -> BoardSnapshot {
        self.compose_at(rankings, Utc::now())
    }

    /// Compose with an explicit timestamp.
    pub fn compose_at(&self, rankings: Vec<AssetRanking>, at: DateTime<Utc>) -> BoardSnapshot {
        let mut metadata = BoardMetadata {
            total: rankings.len(),
            ..BoardMetadata::default()
        };

        let mut big_board = Vec::with_capacity(rankings.len());
        let mut crypto_explorer = Vec::new();

        for mut r in rankings {
            r.kind = self.universe.classify(&r.symbol);
            r.name = self.names.lookup_name(&r.symbol, r.kind);
            match r.kind {
                AssetKind::Stock => metadata.stocks += 1,
                AssetKind::Etf => metadata.etfs += 1,
                AssetKind::Crypto => metadata.crypto += 1,
            }

            if r.kind == AssetKind::Crypto {
                if crypto_explorer.len() < self.top_crypto {
                    big_board.push(r.clone());
                }
                crypto_explorer.push(r);
            } else {
                big_board.push(r);
            }
        }

        info!(
            big_board = big_board.len(),
            crypto_explorer = crypto_explorer.len(),
            stocks = metadata.stocks,
            etfs = metadata.etfs,
            crypto = metadata.crypto,
            "boards composed"
        );

        BoardSnapshot {
            big_board,
            crypto_explorer,
            last_update: at,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratio_core::ranking::order_rankings;

    fn ranking(symbol: &str, wins: u32) -> AssetRanking {
        AssetRanking {
            symbol: symbol.to_string(),
            wins,
            losses: 0,
            total_matchups: wins,
            win_rate: 100.0,
            current_price: 10.0,
            moving_average: 9.0,
            percent_above_ma: 11.11,
            above_ma: true,
            rank: 0,
            kind: AssetKind::default(),
            name: symbol.to_string(),
        }
    }

    /// Crypto C00..C04 ranked above stocks, ETF in the middle.
    fn sample() -> (AssetUniverse, Vec<AssetRanking>) {
        let universe = AssetUniverse {
            stocks: vec!["AAPL".into(), "MSFT".into()],
            etfs: vec!["SPY".into()],
            crypto: (0..5).map(|i| format!("C0{i}")).collect(),
        };
        let mut rankings: Vec<AssetRanking> = (0..5)
            .map(|i| ranking(&format!("C0{i}"), 20 - i))
            .chain([ranking("AAPL", 12), ranking("SPY", 13), ranking("MSFT", 1), ranking("NEWCO", 0)])
            .collect();
        order_rankings(&mut rankings);
        (universe, rankings)
    }

    #[test]
    fn big_board_admits_top_k_crypto() {
        let (universe, rankings) = sample();
        let names = NameBook::new();
        let snap = BoardComposer::new(&universe, &names, 2).compose(rankings);

        let big: Vec<&str> = snap.big_board.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(big, vec!["C00", "C01", "SPY", "AAPL", "MSFT", "NEWCO"]);
        assert_eq!(snap.crypto_explorer.len(), 5);
        assert!(snap.crypto_explorer.iter().all(|r| r.kind == AssetKind::Crypto));
    }

    #[test]
    fn ranks_carry_over_unchanged() {
        let (universe, rankings) = sample();
        let names = NameBook::new();
        let snap = BoardComposer::new(&universe, &names, 2).compose(rankings);
        let ranks: Vec<usize> = snap.big_board.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 6, 7, 8, 9]);
        let crypto_ranks: Vec<usize> = snap.crypto_explorer.iter().map(|r| r.rank).collect();
        assert_eq!(crypto_ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn classification_and_names() {
        let (universe, rankings) = sample();
        let mut names = NameBook::new();
        names.insert("AAPL", "Apple Inc.");
        let snap = BoardComposer::new(&universe, &names, 20).compose(rankings);

        assert_eq!(snap.find("spy").unwrap().kind, AssetKind::Etf);
        assert_eq!(snap.find("NEWCO").unwrap().kind, AssetKind::Stock);
        assert_eq!(snap.find("AAPL").unwrap().name, "Apple Inc.");
        assert_eq!(snap.find("MSFT").unwrap().name, "MSFT");
        assert!(snap.find("NOPE").is_none());
    }

    #[test]
    fn metadata_counts_distinct_symbols() {
        let (universe, rankings) = sample();
        let names = NameBook::new();
        // Every crypto is on both boards; each is still counted once.
        let snap = BoardComposer::new(&universe, &names, 20).compose(rankings);
        assert_eq!(snap.big_board.len(), 9);
        assert_eq!(
            snap.metadata,
            BoardMetadata {
                total: 9,
                stocks: 3,
                etfs: 1,
                crypto: 5
            }
        );
    }

    #[test]
    fn zero_top_k_keeps_crypto_off_big_board() {
        let (universe, rankings) = sample();
        let names = NameBook::new();
        let snap = BoardComposer::new(&universe, &names, 0).compose(rankings);
        assert!(snap.big_board.iter().all(|r| r.kind != AssetKind::Crypto));
        assert_eq!(snap.crypto_explorer.len(), 5);
    }

    #[test]
    fn views_filter_and_limit() {
        let (universe, rankings) = sample();
        let names = NameBook::new();
        let snap = BoardComposer::new(&universe, &names, 2).compose(rankings);

        let stocks = snap.big_board_view(Some(AssetKind::Stock), None);
        assert_eq!(stocks.len(), 3);
        assert_eq!(snap.big_board_view(None, Some(3)).len(), 3);
        assert_eq!(snap.crypto_view(Some(4)).len(), 4);
        assert_eq!(snap.big_board_view(Some(AssetKind::Crypto), None).len(), 2);
    }
}
