//! Full round-robin over every eligible symbol.
//!
//! Eligible symbols are taken in lexicographic order and each unordered pair
//! `(i, j)` with `i < j` is played exactly once through
//! [`wins_matchup`](super::ratio::wins_matchup), giving `N·(N−1)/2` matchups.
//! The pairwise loop is the only CPU-bound part of an update pass; with
//! parallelism enabled it is sharded by row and per-thread tallies are
//! summed, so the result is identical to the sequential pass.
//!
//! Ordering: wins descending, then the asset's own deviation from its moving
//! average descending, then symbol ascending. Ranks are 1-based positions in
//! that order and are never shared.

use rayon::prelude::*;
use tracing::{debug, info};

use super::ratio::wins_matchup;
use crate::domain::{AssetKind, AssetRanking, PriceSeries};
use crate::indicators::sma;
use crate::store::SeriesStore;

/// Default moving-average window (periods).
pub const DEFAULT_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    wins: u32,
    losses: u32,
}

/// The asset's own trend relative to its moving average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OwnTrend {
    pub current_price: f64,
    pub moving_average: f64,
    pub percent_above_ma: f64,
    pub above_ma: bool,
}

/// Current price vs. SMA over `window`, or `None` for a short series.
pub fn own_trend(prices: &[f64], window: usize) -> Option<OwnTrend> {
    let current_price = *prices.first()?;
    let moving_average = sma(prices, window)?;
    let percent_above_ma = if moving_average != 0.0 {
        round_to((current_price - moving_average) / moving_average * 100.0, 2)
    } else {
        0.0
    };
    Some(OwnTrend {
        current_price,
        moving_average,
        percent_above_ma,
        above_ma: current_price > moving_average,
    })
}

/// Number of matchups a round-robin over `n` symbols plays.
pub fn matchup_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

#[derive(Debug, Clone, Copy)]
pub struct TournamentEngine {
    window: usize,
    parallel: bool,
}

impl Default for TournamentEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl TournamentEngine {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            parallel: false,
        }
    }

    /// Enable or disable rayon sharding of the pairwise loop.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Rank every eligible series in the store.
    ///
    /// Ineligible series (fewer than `window` prices) are skipped silently.
    /// Kinds default to stock and names to the symbol; board composition
    /// resolves both.
    pub fn rank(&self, store: &SeriesStore) -> Vec<AssetRanking> {
        let eligible = store.eligible(self.window);
        let skipped = store.len() - eligible.len();
        if skipped > 0 {
            debug!(skipped, window = self.window, "ineligible series excluded from tournament");
        }
        self.rank_series(&eligible)
    }

    /// Rank a set of series. Callers must pass eligible, uniquely-named series.
    pub fn rank_series(&self, series: &[&PriceSeries]) -> Vec<AssetRanking> {
        let mut ordered: Vec<&PriceSeries> = series.to_vec();
        ordered.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let n = ordered.len();
        info!(
            assets = n,
            matchups = matchup_count(n),
            parallel = self.parallel,
            "running tournament"
        );

        let tallies = if self.parallel {
            self.parallel_tallies(&ordered)
        } else {
            self.sequential_tallies(&ordered)
        };

        let mut rankings: Vec<AssetRanking> = ordered
            .iter()
            .zip(&tallies)
            .map(|(s, tally)| self.build_ranking(s, *tally))
            .collect();

        order_rankings(&mut rankings);

        info!(assets = n, "tournament complete");
        rankings
    }

    fn sequential_tallies(&self, series: &[&PriceSeries]) -> Vec<Tally> {
        let mut tallies = vec![Tally::default(); series.len()];
        for i in 0..series.len() {
            play_row(series, i, self.window, &mut tallies);
        }
        tallies
    }

    fn parallel_tallies(&self, series: &[&PriceSeries]) -> Vec<Tally> {
        let n = series.len();
        (0..n)
            .into_par_iter()
            .fold(
                || vec![Tally::default(); n],
                |mut acc, i| {
                    play_row(series, i, self.window, &mut acc);
                    acc
                },
            )
            .reduce(
                || vec![Tally::default(); n],
                |mut acc, part| {
                    for (total, t) in acc.iter_mut().zip(part) {
                        total.wins += t.wins;
                        total.losses += t.losses;
                    }
                    acc
                },
            )
    }

    fn build_ranking(&self, series: &PriceSeries, tally: Tally) -> AssetRanking {
        let total = tally.wins + tally.losses;
        let win_rate = if total > 0 {
            round_to(tally.wins as f64 / total as f64 * 100.0, 1)
        } else {
            0.0
        };
        let trend = own_trend(&series.prices, self.window).unwrap_or(OwnTrend {
            current_price: series.latest().unwrap_or(0.0),
            moving_average: 0.0,
            percent_above_ma: 0.0,
            above_ma: false,
        });

        AssetRanking {
            symbol: series.symbol.clone(),
            wins: tally.wins,
            losses: tally.losses,
            total_matchups: total,
            win_rate,
            current_price: trend.current_price,
            moving_average: trend.moving_average,
            percent_above_ma: trend.percent_above_ma,
            above_ma: trend.above_ma,
            rank: 0,
            kind: AssetKind::default(),
            name: series.symbol.clone(),
        }
    }
}

/// Play symbol `i` against every later symbol, recording both sides.
fn play_row(series: &[&PriceSeries], i: usize, window: usize, tallies: &mut [Tally]) {
    let a = &series[i].prices;
    for j in (i + 1)..series.len() {
        if wins_matchup(a, &series[j].prices, window) {
            tallies[i].wins += 1;
            tallies[j].losses += 1;
        } else {
            tallies[j].wins += 1;
            tallies[i].losses += 1;
        }
    }
}

/// Sort by wins, then own-trend deviation, then symbol, and assign 1-based ranks.
pub fn order_rankings(rankings: &mut [AssetRanking]) {
    rankings.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.percent_above_ma.total_cmp(&a.percent_above_ma))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    for (i, r) in rankings.iter_mut().enumerate() {
        r.rank = i + 1;
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    // Collapse -0.0 so it sorts with 0.0.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Convenience wrapper: sequential tournament over a store.
pub fn calculate_rankings(store: &SeriesStore, window: usize) -> Vec<AssetRanking> {
    TournamentEngine::new(window).rank(store)
}
