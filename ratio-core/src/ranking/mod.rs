//! Pairwise ratio evaluation and the round-robin tournament built on it.

pub mod ratio;
pub mod tournament;

pub use ratio::{evaluate_pair, wins_matchup, PairOutcome, RatioFault};
pub use tournament::{
    calculate_rankings, matchup_count, order_rankings, own_trend, OwnTrend, TournamentEngine,
    DEFAULT_WINDOW,
};
