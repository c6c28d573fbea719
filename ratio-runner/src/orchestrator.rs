//! Update orchestration: fetch → merge → rank → compose.
//!
//! An update never edits the caller's store. It works on a merged copy and
//! hands back a complete [`UpdateOutcome`]; the caller commits it (swap the
//! store, publish the board, persist) only on success. A failed update
//! therefore leaves the previous state exactly as it was.
//!
//! Per-symbol fetch problems are collected as [`FetchFailure`] records and
//! never abort the pass. Only a merged store with fewer than `min_eligible`
//! eligible series, or a single-symbol request for a symbol no provider
//! recognizes, fails the update.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use ratio_core::data::{AssetUniverse, DataError, NameBook, SeriesProvider};
use ratio_core::{AssetKind, PriceSeries, SeriesError, SeriesStore, TournamentEngine};

use crate::board::{BoardComposer, BoardSnapshot};
use crate::config::RatioConfig;
use crate::snapshot::SnapshotError;

/// What an update pass fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateScope {
    Full,
    Kind(AssetKind),
    Symbol(String),
}

impl fmt::Display for UpdateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateScope::Full => f.write_str("full"),
            UpdateScope::Kind(kind) => write!(f, "{kind}"),
            UpdateScope::Symbol(symbol) => write!(f, "symbol:{symbol}"),
        }
    }
}

impl FromStr for UpdateScope {
    type Err = String;

    /// `full`, an asset type (`stocks`, `etfs`, `crypto`), or `symbol:XYZ`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("full") || s.eq_ignore_ascii_case("all") {
            return Ok(UpdateScope::Full);
        }
        if let Some(symbol) = s.strip_prefix("symbol:") {
            let symbol = symbol.trim();
            if symbol.is_empty() {
                return Err("empty symbol in scope".into());
            }
            return Ok(UpdateScope::Symbol(symbol.to_ascii_uppercase()));
        }
        s.parse::<AssetKind>().map(UpdateScope::Kind)
    }
}

#[derive(Debug, Clone)]
pub enum FetchFailureReason {
    Provider(DataError),
    InsufficientHistory { got: usize, required: usize },
    InvalidPrices(SeriesError),
    NoProvider,
}

impl fmt::Display for FetchFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailureReason::Provider(e) => write!(f, "{e}"),
            FetchFailureReason::InsufficientHistory { got, required } => {
                write!(f, "insufficient history: {got} of {required} periods")
            }
            FetchFailureReason::InvalidPrices(e) => write!(f, "{e}"),
            FetchFailureReason::NoProvider => f.write_str("no provider configured"),
        }
    }
}

/// One symbol left out of a pass, and why.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub symbol: String,
    pub kind: AssetKind,
    pub reason: FetchFailureReason,
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("only {eligible} eligible assets after merge; at least {required} required")]
    InsufficientUniverse { eligible: usize, required: usize },

    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Diagnostics for a completed pass.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub scope: Option<UpdateScope>,
    pub requested: usize,
    pub merged: Vec<String>,
    pub failures: Vec<FetchFailure>,
    pub eligible: usize,
    pub ranked: usize,
    pub elapsed: Duration,
}

impl UpdateReport {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Everything a successful pass produced, ready to commit.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub store: SeriesStore,
    pub board: BoardSnapshot,
    pub report: UpdateReport,
}

/// Routes symbols to providers by asset kind, with per-symbol overrides.
#[derive(Clone, Default)]
pub struct ProviderSet {
    by_kind: BTreeMap<AssetKind, Arc<dyn SeriesProvider>>,
    overrides: BTreeMap<String, Arc<dyn SeriesProvider>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same provider for every kind.
    pub fn uniform(provider: Arc<dyn SeriesProvider>) -> Self {
        let mut set = Self::new();
        for kind in AssetKind::ALL {
            set.by_kind.insert(kind, provider.clone());
        }
        set
    }

    pub fn with_kind(mut self, kind: AssetKind, provider: Arc<dyn SeriesProvider>) -> Self {
        self.by_kind.insert(kind, provider);
        self
    }

    pub fn with_override(mut self, symbol: &str, provider: Arc<dyn SeriesProvider>) -> Self {
        self.overrides.insert(symbol.to_ascii_uppercase(), provider);
        self
    }

    pub fn provider_for(&self, symbol: &str, kind: AssetKind) -> Option<&dyn SeriesProvider> {
        self.overrides
            .get(&symbol.to_ascii_uppercase())
            .or_else(|| self.by_kind.get(&kind))
            .map(|p| p.as_ref())
    }
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSet")
            .field(
                "by_kind",
                &self
                    .by_kind
                    .iter()
                    .map(|(k, p)| (k.as_str(), p.name()))
                    .collect::<Vec<_>>(),
            )
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub window: usize,
    pub min_eligible: usize,
    pub top_crypto: usize,
    pub periods: usize,
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub parallel: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&RatioConfig::default())
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &RatioConfig) -> Self {
        Self {
            window: config.ranking.window,
            min_eligible: config.ranking.min_eligible,
            top_crypto: config.ranking.top_crypto,
            periods: config.periods(),
            batch_size: config.fetch.batch_size,
            batch_delay: config.batch_delay(),
            parallel: config.ranking.parallel,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateOrchestrator {
    providers: ProviderSet,
    universe: AssetUniverse,
    settings: OrchestratorSettings,
}

impl UpdateOrchestrator {
    pub fn new(providers: ProviderSet, universe: AssetUniverse, settings: OrchestratorSettings) -> Self {
        Self {
            providers,
            universe,
            settings,
        }
    }

    pub fn universe(&self) -> &AssetUniverse {
        &self.universe
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn engine(&self) -> TournamentEngine {
        TournamentEngine::new(self.settings.window).with_parallelism(self.settings.parallel)
    }

    /// Symbols (with kinds) a scope asks for.
    pub fn targets(&self, scope: &UpdateScope) -> Vec<(String, AssetKind)> {
        match scope {
            UpdateScope::Full => self
                .universe
                .all()
                .map(|(s, k)| (s.to_string(), k))
                .collect(),
            UpdateScope::Kind(kind) => self
                .universe
                .known_symbols(*kind)
                .iter()
                .map(|s| (s.clone(), *kind))
                .collect(),
            UpdateScope::Symbol(symbol) => {
                let symbol = symbol.to_ascii_uppercase();
                let kind = self.universe.classify(&symbol);
                vec![(symbol, kind)]
            }
        }
    }

    /// Fetch the scope, merge into a copy of `store`, and rank the whole
    /// merged store.
    pub fn update(
        &self,
        store: &SeriesStore,
        names: &NameBook,
        scope: &UpdateScope,
    ) -> Result<UpdateOutcome, UpdateError> {
        let started = Instant::now();
        let targets = self.targets(scope);
        info!(scope = %scope, symbols = targets.len(), "update started");

        let (fetched, failures) = self.fetch_all(&targets);

        if let UpdateScope::Symbol(symbol) = scope {
            if let Some(f) = failures.first() {
                if matches!(&f.reason, FetchFailureReason::Provider(e) if e.is_unknown_symbol()) {
                    return Err(UpdateError::UnknownSymbol(symbol.to_ascii_uppercase()));
                }
            }
        }

        let merged_symbols: Vec<String> = fetched.iter().map(|s| s.symbol.clone()).collect();
        let mut merged = store.clone();
        merged.merge(fetched);
        debug!(written = merged_symbols.len(), total = merged.len(), "merged fetched series");

        let (board, eligible) = self.rank_and_compose(&merged, names)?;
        let report = UpdateReport {
            scope: Some(scope.clone()),
            requested: targets.len(),
            merged: merged_symbols,
            failures,
            eligible,
            ranked: board.metadata.total,
            elapsed: started.elapsed(),
        };
        info!(
            scope = %scope,
            merged = report.merged.len(),
            failed = report.failures.len(),
            ranked = report.ranked,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "update complete"
        );

        Ok(UpdateOutcome {
            store: merged,
            board,
            report,
        })
    }

    /// Re-rank the store as-is, without fetching.
    pub fn recompute(&self, store: &SeriesStore, names: &NameBook) -> Result<UpdateOutcome, UpdateError> {
        let started = Instant::now();
        let (board, eligible) = self.rank_and_compose(store, names)?;
        let report = UpdateReport {
            scope: None,
            requested: 0,
            merged: Vec::new(),
            failures: Vec::new(),
            eligible,
            ranked: board.metadata.total,
            elapsed: started.elapsed(),
        };
        info!(ranked = report.ranked, "recompute complete");
        Ok(UpdateOutcome {
            store: store.clone(),
            board,
            report,
        })
    }

    fn rank_and_compose(
        &self,
        store: &SeriesStore,
        names: &NameBook,
    ) -> Result<(BoardSnapshot, usize), UpdateError> {
        let eligible = store.eligible_count(self.settings.window);
        if eligible < self.settings.min_eligible {
            warn!(
                eligible,
                required = self.settings.min_eligible,
                "not enough eligible assets; keeping previous state"
            );
            return Err(UpdateError::InsufficientUniverse {
                eligible,
                required: self.settings.min_eligible,
            });
        }

        let rankings = self.engine().rank(store);
        let board = BoardComposer::new(&self.universe, names, self.settings.top_crypto).compose(rankings);
        Ok((board, eligible))
    }

    /// Fetch every target in order, pausing between batches.
    fn fetch_all(&self, targets: &[(String, AssetKind)]) -> (Vec<PriceSeries>, Vec<FetchFailure>) {
        let mut fetched = Vec::with_capacity(targets.len());
        let mut failures = Vec::new();
        let mut current_kind = None;

        for (i, (symbol, kind)) in targets.iter().enumerate() {
            if current_kind != Some(*kind) {
                info!(kind = %kind, "fetching");
                current_kind = Some(*kind);
            }
            if i > 0
                && self.settings.batch_size > 0
                && i % self.settings.batch_size == 0
                && !self.settings.batch_delay.is_zero()
            {
                std::thread::sleep(self.settings.batch_delay);
            }

            match self.fetch_one(symbol, *kind) {
                Ok(series) => {
                    debug!(symbol = %symbol, periods = series.len(), "fetched");
                    fetched.push(series);
                }
                Err(reason) => {
                    warn!(symbol = %symbol, kind = %kind, reason = %reason, "fetch failed; symbol skipped");
                    failures.push(FetchFailure {
                        symbol: symbol.clone(),
                        kind: *kind,
                        reason,
                    });
                }
            }
        }

        (fetched, failures)
    }

    fn fetch_one(&self, symbol: &str, kind: AssetKind) -> Result<PriceSeries, FetchFailureReason> {
        let provider = self
            .providers
            .provider_for(symbol, kind)
            .ok_or(FetchFailureReason::NoProvider)?;
        if !provider.is_available() {
            return Err(FetchFailureReason::Provider(DataError::CircuitBreakerTripped));
        }

        let mut series = provider
            .fetch_series(symbol, self.settings.periods)
            .map_err(FetchFailureReason::Provider)?;
        series.symbol = symbol.to_string();
        series.truncate(self.settings.periods);
        series.validate().map_err(FetchFailureReason::InvalidPrices)?;

        if series.len() < self.settings.window {
            return Err(FetchFailureReason::InsufficientHistory {
                got: series.len(),
                required: self.settings.window,
            });
        }
        Ok(series)
    }
}
