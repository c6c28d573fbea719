//! Plain-text summary and CSV export of ranking boards.

use anyhow::{Context, Result};
use ratio_core::AssetRanking;

/// Fixed-width table of the top `top_n` rankings.
pub fn format_rankings_summary(rankings: &[AssetRanking], top_n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>4}  {:<8} {:<6} {:>5} {:>6}  {:>8}  {}\n",
        "Rank", "Symbol", "Type", "Wins", "Win%", "vs MA", "Name"
    ));
    out.push_str(&format!("{}\n", "-".repeat(60)));

    for r in rankings.iter().take(top_n) {
        let mark = if r.above_ma { '+' } else { '-' };
        out.push_str(&format!(
            "{:>4}  {:<8} {:<6} {:>5} {:>5.1}%  {:>7.2}%{} {}\n",
            r.rank,
            r.symbol,
            r.kind.as_str(),
            r.wins,
            r.win_rate,
            r.percent_above_ma,
            mark,
            r.name
        ));
    }

    if rankings.len() > top_n {
        out.push_str(&format!("... {} more\n", rankings.len() - top_n));
    }
    out
}

/// Export every ranking field as CSV.
///
/// Columns: rank, symbol, name, type, wins, losses, total_matchups, win_rate,
/// current_price, moving_average, percent_above_ma, above_ma
pub fn export_rankings_csv(rankings: &[AssetRanking]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "rank",
        "symbol",
        "name",
        "type",
        "wins",
        "losses",
        "total_matchups",
        "win_rate",
        "current_price",
        "moving_average",
        "percent_above_ma",
        "above_ma",
    ])?;

    for r in rankings {
        wtr.write_record([
            r.rank.to_string(),
            r.symbol.clone(),
            r.name.clone(),
            r.kind.as_str().to_string(),
            r.wins.to_string(),
            r.losses.to_string(),
            r.total_matchups.to_string(),
            format!("{:.1}", r.win_rate),
            r.current_price.to_string(),
            r.moving_average.to_string(),
            format!("{:.2}", r.percent_above_ma),
            r.above_ma.to_string(),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush rankings CSV")?;
    String::from_utf8(bytes).context("rankings CSV is not valid UTF-8")
}
