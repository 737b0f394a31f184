//! Snapshot store for persisting the last forecast to disk
//!
//! Provides a `SnapshotStore` that keeps the most recent `ForecastSnapshot` as a
//! JSON file with an expiry timestamp, so a later process can show the last
//! forecast without fetching.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::error::ForecastError;
use crate::pv::ForecastSnapshot;

/// File name of the stored snapshot
const SNAPSHOT_FILE: &str = "last_snapshot.json";

/// Wrapper struct for the snapshot stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry<T> {
    snapshot: T,
    stored_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// A snapshot read back from disk, with freshness metadata
#[derive(Debug)]
pub struct StoredSnapshot {
    pub snapshot: ForecastSnapshot,
    /// When the snapshot was written
    pub stored_at: DateTime<Utc>,
    /// Whether the entry is past its expiry
    pub is_stale: bool,
}

/// Reads and writes the last snapshot
///
/// Files live in an XDG-compliant cache directory (`~/.cache/pvforecast/` on
/// Linux). Stale entries are still returned, flagged with `is_stale`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Directory where the snapshot file is stored
    cache_dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a store in the XDG cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "pvforecast")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a store in a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn snapshot_path(&self) -> PathBuf {
        self.cache_dir.join(SNAPSHOT_FILE)
    }

    /// Writes the snapshot, replacing any previous one
    ///
    /// # Arguments
    /// * `snapshot` - the snapshot to keep
    /// * `ttl_hours` - how long the entry counts as fresh
    pub fn save(&self, snapshot: &ForecastSnapshot, ttl_hours: u64) -> Result<(), ForecastError> {
        fs::create_dir_all(&self.cache_dir)?;

        let now = Utc::now();
        let entry = StoredEntry {
            snapshot,
            stored_at: now,
            expires_at: now + Duration::hours(ttl_hours as i64),
        };
        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| ForecastError::Cache(e.to_string()))?;

        let path = self.snapshot_path();
        fs::write(&path, json)?;
        debug!(path = %path.display(), "snapshot stored");
        Ok(())
    }

    /// Reads the stored snapshot
    ///
    /// # Returns
    /// * `Ok(None)` if nothing has been stored yet
    /// * `Ok(Some(StoredSnapshot))` with `is_stale` set past the expiry
    /// * `Err(ForecastError::Cache)` if the file is unreadable or corrupt
    pub fn load(&self) -> Result<Option<StoredSnapshot>, ForecastError> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let entry: StoredEntry<ForecastSnapshot> = serde_json::from_str(&content)
            .map_err(|e| ForecastError::Cache(format!("corrupt snapshot file: {}", e)))?;

        Ok(Some(StoredSnapshot {
            snapshot: entry.snapshot,
            stored_at: entry.stored_at,
            is_stale: Utc::now() > entry.expires_at,
        }))
    }
}
