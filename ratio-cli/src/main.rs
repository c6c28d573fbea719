//! Ratio CLI — update, query and export relative-strength rankings.
//!
//! Commands:
//! - `update` — fetch a scope (full, one asset type, one symbol) and re-rank
//! - `recompute` — re-rank cached series without fetching
//! - `board` / `crypto` / `asset` — read the published boards
//! - `matchup` — head-to-head on cached series
//! - `remove` — drop a symbol from the cache and re-rank
//! - `export` — write a board as CSV
//! - `status` — last update, board sizes, cache size
//! - `worker` — update on start, then daily at the configured UTC time

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ratio_core::data::{AssetUniverse, NameBook, SyntheticProvider};
use ratio_core::AssetKind;
use ratio_runner::{
    export_rankings_csv, format_rankings_summary, live_providers, until_next_run,
    OrchestratorSettings, ProviderSet, RankingService, RatioConfig, SnapshotFile,
    UpdateOrchestrator, UpdateReport, UpdateScope,
};

#[derive(Parser)]
#[command(
    name = "ratio",
    about = "Ratio CLI — pairwise relative-strength rankings for stocks, ETFs and crypto"
)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch price series for a scope, merge into the cache and re-rank everything.
    Update {
        /// full, stocks, etfs or crypto.
        #[arg(long, default_value = "full")]
        scope: String,

        /// Update a single symbol (overrides --scope).
        #[arg(long)]
        symbol: Option<String>,

        /// Use deterministic synthetic prices instead of the network.
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
    /// Re-rank cached series without fetching.
    Recompute,
    /// Show the big board.
    Board {
        /// Restrict to one asset type (stocks, etfs, crypto).
        #[arg(long = "type")]
        kind: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the crypto explorer.
    Crypto {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one asset's ranking.
    Asset { symbol: String },
    /// Head-to-head matchup of A against B on cached series.
    Matchup { a: String, b: String },
    /// Remove a symbol from the cache and re-rank.
    Remove { symbol: String },
    /// Export a board as CSV.
    Export {
        #[arg(long)]
        out: PathBuf,

        #[arg(long, value_enum, default_value_t = BoardChoice::Big)]
        board: BoardChoice,
    },
    /// Last update time, board sizes and cache size.
    Status,
    /// Update now, then every day at the configured UTC time.
    Worker {
        #[arg(long, default_value_t = false)]
        synthetic: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BoardChoice {
    Big,
    Crypto,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = RatioConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Update {
            scope,
            symbol,
            synthetic,
        } => {
            let scope = match symbol {
                Some(s) => UpdateScope::Symbol(s.to_ascii_uppercase()),
                None => scope.parse::<UpdateScope>().map_err(anyhow::Error::msg)?,
            };
            run_update(&config, &scope, synthetic)
        }
        Commands::Recompute => {
            let service = open_service(&config, false)?;
            let report = service.recompute()?;
            print_report(&report);
            print_top(&service, 10)
        }
        Commands::Board { kind, limit } => {
            let kind = kind
                .as_deref()
                .map(str::parse::<AssetKind>)
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let service = open_service(&config, false)?;
            let rankings = service.big_board(kind, limit)?;
            print!("{}", format_rankings_summary(&rankings, rankings.len()));
            Ok(())
        }
        Commands::Crypto { limit } => {
            let service = open_service(&config, false)?;
            let rankings = service.crypto_explorer(limit)?;
            print!("{}", format_rankings_summary(&rankings, rankings.len()));
            Ok(())
        }
        Commands::Asset { symbol } => {
            let service = open_service(&config, false)?;
            let r = service.asset(&symbol)?;
            println!("{} ({}, {})", r.symbol, r.name, r.kind);
            println!("  Rank:         #{}", r.rank);
            println!("  Record:       {}-{} of {}", r.wins, r.losses, r.total_matchups);
            println!("  Win rate:     {:.1}%", r.win_rate);
            println!("  Price:        {}", r.current_price);
            println!("  {}-period MA: {}", config.ranking.window, r.moving_average);
            println!(
                "  vs MA:        {:+.2}% ({})",
                r.percent_above_ma,
                if r.above_ma { "above" } else { "below" }
            );
            Ok(())
        }
        Commands::Matchup { a, b } => {
            let service = open_service(&config, false)?;
            let verdict = service.pairwise_matchup(&a, &b)?;
            println!(
                "{} vs {}: {verdict}",
                a.to_ascii_uppercase(),
                b.to_ascii_uppercase()
            );
            Ok(())
        }
        Commands::Remove { symbol } => {
            let service = open_service(&config, false)?;
            let report = service.remove_symbol(&symbol)?;
            println!("Removed {}; {} assets ranked", symbol.to_ascii_uppercase(), report.ranked);
            Ok(())
        }
        Commands::Export { out, board } => {
            let service = open_service(&config, false)?;
            let rankings = match board {
                BoardChoice::Big => service.big_board(None, None)?,
                BoardChoice::Crypto => service.crypto_explorer(None)?,
            };
            let csv = export_rankings_csv(&rankings)?;
            std::fs::write(&out, csv).with_context(|| format!("failed to write {}", out.display()))?;
            println!("Exported {} rankings to {}", rankings.len(), out.display());
            Ok(())
        }
        Commands::Status => run_status(&config),
        Commands::Worker { synthetic } => run_worker(&config, synthetic),
    }
}

fn open_service(config: &RatioConfig, synthetic: bool) -> Result<RankingService> {
    let universe = match &config.paths.universe {
        Some(path) => AssetUniverse::from_file(path)?,
        None => AssetUniverse::default_lists(),
    };
    let settings = OrchestratorSettings::from_config(config);

    let (providers, name_source) = if synthetic {
        (ProviderSet::uniform(Arc::new(SyntheticProvider::new())), None)
    } else {
        let live = live_providers(config)?;
        (live.series, live.names)
    };

    let orchestrator = UpdateOrchestrator::new(providers, universe, settings);
    let mut service = RankingService::open(
        orchestrator,
        SnapshotFile::new(&config.paths.snapshot),
        NameBook::open(&config.paths.names),
    )?;
    if let Some(source) = name_source {
        service = service.with_name_source(source);
    }
    Ok(service)
}

fn run_update(config: &RatioConfig, scope: &UpdateScope, synthetic: bool) -> Result<()> {
    if !synthetic
        && config.providers.polygon_api_key.is_empty()
        && !matches!(scope, UpdateScope::Kind(AssetKind::Crypto))
    {
        warn!("MASSIVE_API_KEY is not set; stock and ETF fetches will fail (use --synthetic for offline runs)");
    }

    let service = open_service(config, synthetic)?;
    let report = service.trigger_update(scope)?;
    print_report(&report);
    print_top(&service, 10)
}

fn run_status(config: &RatioConfig) -> Result<()> {
    let service = open_service(config, false)?;
    let health = match service.health() {
        Ok(h) => h,
        Err(ratio_runner::ServiceError::NotLoaded) => {
            println!("No rankings yet ({} cached series).", service.stored_series());
            println!("Snapshot: {}", config.paths.snapshot.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Last update:     {}", health.last_update.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Big board:       {}", health.big_board);
    println!("Crypto explorer: {}", health.crypto_explorer);
    println!(
        "Ranked:          {} ({} stocks, {} ETFs, {} crypto)",
        health.metadata.total, health.metadata.stocks, health.metadata.etfs, health.metadata.crypto
    );
    println!("Cached series:   {}", health.stored_series);
    println!("Dataset hash:    {}", &health.dataset_hash[..16.min(health.dataset_hash.len())]);
    println!("Snapshot:        {}", config.paths.snapshot.display());
    Ok(())
}

fn run_worker(config: &RatioConfig, synthetic: bool) -> Result<()> {
    let daily_at = config.daily_at()?;
    let service = open_service(config, synthetic)?;
    info!(daily_at = %daily_at, "worker started");

    loop {
        match service.trigger_update(&UpdateScope::Full) {
            Ok(report) => info!(
                ranked = report.ranked,
                failed = report.failures.len(),
                "scheduled update complete"
            ),
            Err(e) => error!(error = %e, "scheduled update failed; keeping previous rankings"),
        }

        let now = Utc::now();
        let wait = until_next_run(now, daily_at);
        info!(
            next_run = %(now + chrono::Duration::seconds(wait.as_secs() as i64)).format("%Y-%m-%d %H:%M UTC"),
            "sleeping until next update"
        );
        std::thread::sleep(wait);
    }
}

fn print_report(report: &UpdateReport) {
    match &report.scope {
        Some(scope) => println!(
            "Update ({scope}): {} of {} fetched, {} eligible, {} ranked in {:.1}s",
            report.merged.len(),
            report.requested,
            report.eligible,
            report.ranked,
            report.elapsed.as_secs_f64()
        ),
        None => println!("Recomputed: {} eligible, {} ranked", report.eligible, report.ranked),
    }
    for f in &report.failures {
        eprintln!("  skipped {} ({}): {}", f.symbol, f.kind, f.reason);
    }
}

fn print_top(service: &RankingService, n: usize) -> Result<()> {
    let board = service.big_board(None, Some(n))?;
    if board.is_empty() {
        bail!("update produced an empty big board");
    }
    println!();
    print!("{}", format_rankings_summary(&board, n));
    Ok(())
}
