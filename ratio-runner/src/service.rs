//! Ranking service: the caller-facing facade over store, orchestrator and
//! published boards.
//!
//! Writers (update, recompute, remove) hold the name book's `Mutex` for the
//! whole pass, so a manual trigger that overlaps a scheduled pass waits for
//! it instead of interleaving merges. What readers see is published
//! separately: the series store and the board, each behind an `Arc`, swapped
//! together under one short `RwLock` write. Readers clone the `Arc`s and never
//! wait on a pass in flight or see a store from one pass next to a board
//! from another.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use ratio_core::data::{NameBook, NameSource};
use ratio_core::ranking::{evaluate_pair, PairOutcome, RatioFault};
use ratio_core::{AssetKind, AssetRanking, SeriesStore};

use crate::board::{BoardMetadata, BoardSnapshot};
use crate::orchestrator::{UpdateError, UpdateOrchestrator, UpdateOutcome, UpdateReport, UpdateScope};
use crate::snapshot::{PersistedSnapshot, SnapshotError, SnapshotFile};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("rankings not loaded yet; run an update first")]
    NotLoaded,

    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),

    #[error("update failed: {0}")]
    Update(#[from] UpdateError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Ad hoc head-to-head result from the first symbol's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchupVerdict {
    Win,
    Loss,
    /// Not enough cached history to judge the pair.
    NotAvailable,
}

impl std::fmt::Display for MatchupVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MatchupVerdict::Win => "W",
            MatchupVerdict::Loss => "L",
            MatchupVerdict::NotAvailable => "N/A",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Health {
    pub last_update: DateTime<Utc>,
    pub big_board: usize,
    pub crypto_explorer: usize,
    pub stored_series: usize,
    pub metadata: BoardMetadata,
    pub dataset_hash: String,
}

#[derive(Clone)]
struct Published {
    store: Arc<SeriesStore>,
    board: Option<Arc<BoardSnapshot>>,
}

pub struct RankingService {
    writer: Mutex<NameBook>,
    published: RwLock<Published>,
    orchestrator: UpdateOrchestrator,
    snapshot: Option<SnapshotFile>,
    name_source: Option<Arc<dyn NameSource>>,
}

impl RankingService {
    /// In-memory service with an empty store and nothing persisted.
    pub fn new(orchestrator: UpdateOrchestrator) -> Self {
        Self::with_state(orchestrator, SeriesStore::new(), NameBook::new(), None)
    }

    fn with_state(
        orchestrator: UpdateOrchestrator,
        store: SeriesStore,
        names: NameBook,
        board: Option<BoardSnapshot>,
    ) -> Self {
        Self {
            writer: Mutex::new(names),
            published: RwLock::new(Published {
                store: Arc::new(store),
                board: board.map(Arc::new),
            }),
            orchestrator,
            snapshot: None,
            name_source: None,
        }
    }

    /// Restore store and boards from `snapshot` (if it exists) and persist
    /// every committed pass back to it.
    pub fn open(
        orchestrator: UpdateOrchestrator,
        snapshot: SnapshotFile,
        names: NameBook,
    ) -> Result<Self, ServiceError> {
        let (store, board) = match snapshot.load()? {
            Some(persisted) => {
                let board = persisted.board();
                (persisted.assets, board)
            }
            None => (SeriesStore::new(), None),
        };
        let mut service = Self::with_state(orchestrator, store, names, board);
        service.snapshot = Some(snapshot);
        Ok(service)
    }

    /// Best-effort display-name lookups before each update.
    pub fn with_name_source(mut self, source: Arc<dyn NameSource>) -> Self {
        self.name_source = Some(source);
        self
    }

    pub fn orchestrator(&self) -> &UpdateOrchestrator {
        &self.orchestrator
    }

    fn writer(&self) -> MutexGuard<'_, NameBook> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn published(&self) -> Published {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self) -> Arc<SeriesStore> {
        self.published().store
    }

    fn current_board(&self) -> Result<Arc<BoardSnapshot>, ServiceError> {
        self.published().board.ok_or(ServiceError::NotLoaded)
    }

    /// The published board, if any pass has completed.
    pub fn snapshot(&self) -> Option<Arc<BoardSnapshot>> {
        self.current_board().ok()
    }

    pub fn big_board(
        &self,
        kind: Option<AssetKind>,
        limit: Option<usize>,
    ) -> Result<Vec<AssetRanking>, ServiceError> {
        Ok(self.current_board()?.big_board_view(kind, limit))
    }

    pub fn crypto_explorer(&self, limit: Option<usize>) -> Result<Vec<AssetRanking>, ServiceError> {
        Ok(self.current_board()?.crypto_view(limit))
    }

    pub fn asset(&self, symbol: &str) -> Result<AssetRanking, ServiceError> {
        self.current_board()?
            .find(symbol)
            .cloned()
            .ok_or_else(|| ServiceError::UnknownSymbol(symbol.to_ascii_uppercase()))
    }

    /// Fetch `scope`, merge, re-rank everything and publish.
    pub fn trigger_update(&self, scope: &UpdateScope) -> Result<UpdateReport, ServiceError> {
        let mut names = self.writer();
        if let Some(source) = &self.name_source {
            let targets = self.orchestrator.targets(scope);
            names.refresh(targets.iter().map(|(s, k)| (s.as_str(), *k)), source.as_ref());
        }
        let outcome = self.orchestrator.update(&self.store(), &names, scope)?;
        self.commit(outcome)
    }

    /// Re-rank the cached store without fetching.
    pub fn recompute(&self) -> Result<UpdateReport, ServiceError> {
        let names = self.writer();
        let outcome = self.orchestrator.recompute(&self.store(), &names)?;
        self.commit(outcome)
    }

    /// Drop a symbol's cached series and re-rank without it.
    ///
    /// Rejected (nothing changes) when the remaining store would fall below
    /// the eligibility minimum.
    pub fn remove_symbol(&self, symbol: &str) -> Result<UpdateReport, ServiceError> {
        let symbol = symbol.to_ascii_uppercase();
        let names = self.writer();
        let store = self.store();
        if !store.contains(&symbol) {
            return Err(ServiceError::UnknownSymbol(symbol));
        }
        let mut remaining = SeriesStore::clone(&store);
        remaining.remove(&symbol);
        let outcome = self.orchestrator.recompute(&remaining, &names)?;
        info!(symbol = %symbol, "symbol removed");
        self.commit(outcome)
    }

    /// Head-to-head on cached series only.
    pub fn pairwise_matchup(&self, a: &str, b: &str) -> Result<MatchupVerdict, ServiceError> {
        let (a, b) = (a.to_ascii_uppercase(), b.to_ascii_uppercase());
        let store = self.store();
        let series_a = store
            .get(&a)
            .ok_or_else(|| ServiceError::UnknownSymbol(a.clone()))?;
        let series_b = store
            .get(&b)
            .ok_or_else(|| ServiceError::UnknownSymbol(b.clone()))?;

        let window = self.orchestrator.settings().window;
        Ok(match evaluate_pair(&series_a.prices, &series_b.prices, window) {
            Ok(PairOutcome::AWins) => MatchupVerdict::Win,
            Ok(PairOutcome::BWins) => MatchupVerdict::Loss,
            Err(RatioFault::ZeroDenominator { .. }) => MatchupVerdict::Loss,
            Err(RatioFault::EmptyWindow | RatioFault::InsufficientHistory { .. }) => {
                MatchupVerdict::NotAvailable
            }
        })
    }

    pub fn health(&self) -> Result<Health, ServiceError> {
        let Published { store, board } = self.published();
        let board = board.ok_or(ServiceError::NotLoaded)?;
        Ok(Health {
            last_update: board.last_update,
            big_board: board.big_board.len(),
            crypto_explorer: board.crypto_explorer.len(),
            stored_series: store.len(),
            metadata: board.metadata,
            dataset_hash: store.fingerprint(),
        })
    }

    /// Number of cached series, loaded or not.
    pub fn stored_series(&self) -> usize {
        self.store().len()
    }

    /// Persist, then publish store and board together. A failed save leaves
    /// the published state as it was. Callers hold the writer lock.
    fn commit(&self, outcome: UpdateOutcome) -> Result<UpdateReport, ServiceError> {
        let UpdateOutcome { store, board, report } = outcome;
        if let Some(file) = &self.snapshot {
            let persisted = PersistedSnapshot::new(&store, Some(&board), self.orchestrator.settings().window);
            if let Err(e) = file.save(&persisted) {
                warn!(error = %e, "snapshot not saved; keeping previous state");
                return Err(e.into());
            }
        }
        *self.published.write().unwrap_or_else(PoisonError::into_inner) = Published {
            store: Arc::new(store),
            board: Some(Arc::new(board)),
        };
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{OrchestratorSettings, ProviderSet};
    use ratio_core::data::{AssetUniverse, SyntheticProvider};
    use ratio_core::PriceSeries;
    use std::time::Duration;

    fn universe() -> AssetUniverse {
        AssetUniverse {
            stocks: (0..9).map(|i| format!("S{i}")).collect(),
            etfs: vec!["E0".into()],
            crypto: (0..3).map(|i| format!("C{i}")).collect(),
        }
    }

    fn orchestrator() -> UpdateOrchestrator {
        UpdateOrchestrator::new(
            ProviderSet::uniform(Arc::new(SyntheticProvider::new())),
            universe(),
            OrchestratorSettings {
                batch_delay: Duration::ZERO,
                top_crypto: 2,
                ..OrchestratorSettings::default()
            },
        )
    }

    #[test]
    fn reads_before_first_pass_are_not_loaded() {
        let service = RankingService::new(orchestrator());
        assert!(matches!(service.big_board(None, None), Err(ServiceError::NotLoaded)));
        assert!(matches!(service.crypto_explorer(None), Err(ServiceError::NotLoaded)));
        assert!(matches!(service.asset("S0"), Err(ServiceError::NotLoaded)));
        assert!(matches!(service.health(), Err(ServiceError::NotLoaded)));
    }

    #[test]
    fn update_publishes_boards() {
        let service = RankingService::new(orchestrator());
        let report = service.trigger_update(&UpdateScope::Full).unwrap();
        assert_eq!(report.ranked, 13);

        assert_eq!(service.crypto_explorer(None).unwrap().len(), 3);
        assert_eq!(service.big_board(None, None).unwrap().len(), 12);
        assert_eq!(service.big_board(Some(AssetKind::Etf), None).unwrap().len(), 1);
        assert_eq!(service.asset("s3").unwrap().symbol, "S3");
        assert!(matches!(service.asset("ZZZ"), Err(ServiceError::UnknownSymbol(_))));

        let health = service.health().unwrap();
        assert_eq!(health.stored_series, 13);
        assert_eq!(health.metadata.total, 13);
    }

    #[test]
    fn matchup_never_has_two_winners() {
        let service = RankingService::new(orchestrator());
        service.trigger_update(&UpdateScope::Full).unwrap();

        let ab = service.pairwise_matchup("S0", "S1").unwrap();
        let ba = service.pairwise_matchup("S1", "S0").unwrap();
        assert_ne!(ab, MatchupVerdict::NotAvailable);
        assert_ne!(ba, MatchupVerdict::NotAvailable);
        assert!(!(ab == MatchupVerdict::Win && ba == MatchupVerdict::Win));
        assert!(matches!(
            service.pairwise_matchup("S0", "NOPE"),
            Err(ServiceError::UnknownSymbol(s)) if s == "NOPE"
        ));
    }

    #[test]
    fn short_cached_series_is_not_available() {
        let store: SeriesStore = vec![
            PriceSeries::new("A", vec![10.0; 20]),
            PriceSeries::new("B", vec![5.0; 5]),
        ]
        .into_iter()
        .collect();
        let service = RankingService::with_state(orchestrator(), store, NameBook::new(), None);
        assert_eq!(
            service.pairwise_matchup("a", "b").unwrap(),
            MatchupVerdict::NotAvailable
        );
    }

    #[test]
    fn remove_below_minimum_is_rejected() {
        let service = RankingService::new(orchestrator());
        service.trigger_update(&UpdateScope::Full).unwrap();
        // 13 stored, minimum 10: three removals succeed, the fourth is refused.
        for s in ["S0", "S1", "S2"] {
            service.remove_symbol(s).unwrap();
        }
        assert!(matches!(
            service.remove_symbol("S3"),
            Err(ServiceError::Update(UpdateError::InsufficientUniverse { .. }))
        ));
        assert_eq!(service.stored_series(), 10);
        assert!(service.asset("S3").is_ok());
        assert!(matches!(service.remove_symbol("S0"), Err(ServiceError::UnknownSymbol(_))));
    }

    #[test]
    fn committed_pass_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data_cache.json");

        let service =
            RankingService::open(orchestrator(), SnapshotFile::new(&path), NameBook::new()).unwrap();
        service.trigger_update(&UpdateScope::Full).unwrap();
        let before: Vec<(String, usize)> = service
            .big_board(None, None)
            .unwrap()
            .into_iter()
            .map(|r| (r.symbol, r.rank))
            .collect();

        let reopened =
            RankingService::open(orchestrator(), SnapshotFile::new(&path), NameBook::new()).unwrap();
        let after: Vec<(String, usize)> = reopened
            .big_board(None, None)
            .unwrap()
            .into_iter()
            .map(|r| (r.symbol, r.rank))
            .collect();
        assert_eq!(after, before);
        assert_eq!(reopened.stored_series(), 13);
    }
}
