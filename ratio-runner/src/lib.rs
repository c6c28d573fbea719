//! Ratio Runner — update orchestration, board composition, persistence and
//! the ranking service.
//!
//! This crate builds on `ratio-core` to provide:
//! - TOML configuration with environment overrides
//! - Live provider wiring with one circuit breaker per upstream host
//! - Scoped update passes (fetch, merge, rank, compose) with per-symbol
//!   failure isolation
//! - Big board / crypto explorer composition
//! - Atomic JSON snapshot persistence
//! - The `RankingService` facade used by the CLI and the worker
//! - Text summary and CSV export, daily schedule helper

pub mod board;
pub mod config;
pub mod orchestrator;
pub mod providers;
pub mod report;
pub mod schedule;
pub mod service;
pub mod snapshot;

pub use board::{BoardComposer, BoardMetadata, BoardSnapshot};
pub use config::{ConfigError, RatioConfig};
pub use orchestrator::{
    FetchFailure, FetchFailureReason, OrchestratorSettings, ProviderSet, UpdateError,
    UpdateOrchestrator, UpdateOutcome, UpdateReport, UpdateScope,
};
pub use providers::{live_providers, LiveProviders};
pub use report::{export_rankings_csv, format_rankings_summary};
pub use schedule::{next_run_after, until_next_run};
pub use service::{Health, MatchupVerdict, RankingService, ServiceError};
pub use snapshot::{PersistedSnapshot, SnapshotError, SnapshotFile};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn service_is_send_sync() {
        assert_send::<RankingService>();
        assert_sync::<RankingService>();
    }

    #[test]
    fn snapshot_types_are_send_sync() {
        assert_send::<BoardSnapshot>();
        assert_sync::<BoardSnapshot>();
        assert_send::<PersistedSnapshot>();
        assert_sync::<PersistedSnapshot>();
    }

    #[test]
    fn update_types_are_send_sync() {
        assert_send::<UpdateReport>();
        assert_sync::<UpdateReport>();
        assert_send::<UpdateOrchestrator>();
        assert_sync::<UpdateOrchestrator>();
    }
}
