//! On-disk snapshot: the series store plus the last published boards.
//!
//! Layout (pretty JSON):
//!
//! ```json
//! {
//!   "assets": { "AAPL": [190.5, 185.0, ...], ... },
//!   "big_board": [ ... ],
//!   "crypto_explorer": [ ... ],
//!   "last_update": "2024-06-28T02:00:00Z",
//!   "metadata": { "total": 52, "stocks": 20, "etfs": 12, "crypto": 20,
//!                 "window": 20, "dataset_hash": "..." }
//! }
//! ```
//!
//! Cache files written by the earlier service also load: `total_assets` in
//! place of `total`, `ma` in place of `moving_average`, and a `last_update`
//! without an offset, which is read as UTC.
//!
//! Writes go to a sibling `.tmp` file that is renamed over the target, so a
//! reader never sees a half-written snapshot.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use ratio_core::{AssetRanking, SeriesStore};

use crate::board::{BoardMetadata, BoardSnapshot};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {path} is not valid: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedMetadata {
    #[serde(flatten)]
    pub counts: BoardMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    #[serde(default)]
    pub assets: SeriesStore,
    #[serde(default)]
    pub big_board: Vec<AssetRanking>,
    #[serde(default)]
    pub crypto_explorer: Vec<AssetRanking>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: PersistedMetadata,
}

/// RFC 3339, or a naive ISO 8601 timestamp taken as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| serde::de::Error::custom(format!("bad last_update '{raw}': {e}")))
}

impl PersistedSnapshot {
    pub fn new(store: &SeriesStore, board: Option<&BoardSnapshot>, window: usize) -> Self {
        let mut snapshot = Self {
            assets: store.clone(),
            metadata: PersistedMetadata {
                counts: BoardMetadata::default(),
                window: Some(window),
                dataset_hash: Some(store.fingerprint()),
            },
            ..Self::default()
        };
        if let Some(board) = board {
            snapshot.big_board = board.big_board.clone();
            snapshot.crypto_explorer = board.crypto_explorer.clone();
            snapshot.last_update = Some(board.last_update);
            snapshot.metadata.counts = board.metadata;
        }
        snapshot
    }

    /// Published boards, if a pass has ever completed.
    pub fn board(&self) -> Option<BoardSnapshot> {
        self.last_update.map(|last_update| BoardSnapshot {
            big_board: self.big_board.clone(),
            crypto_explorer: self.crypto_explorer.clone(),
            last_update,
            metadata: self.metadata.counts,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// `Ok(None)` when no snapshot has been written yet.
    pub fn load(&self) -> Result<Option<PersistedSnapshot>, SnapshotError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot on disk");
                return Ok(None);
            }
            Err(e) => return Err(self.io_err(e)),
        };
        let snapshot: PersistedSnapshot =
            serde_json::from_str(&content).map_err(|source| SnapshotError::Parse {
                path: self.path.display().to_string(),
                source,
            })?;
        info!(
            path = %self.path.display(),
            assets = snapshot.assets.len(),
            big_board = snapshot.big_board.len(),
            "snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    pub fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }
        let json = serde_json::to_string_pretty(snapshot).map_err(SnapshotError::Serialize)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).map_err(|e| self.io_err(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;

        info!(
            path = %self.path.display(),
            assets = snapshot.assets.len(),
            "snapshot saved"
        );
        Ok(())
    }
}
