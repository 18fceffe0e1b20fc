use rusqlite::{Connection, Result};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::app_data_dir;

pub struct Database {
    conn: Mutex<Connection>,
    /// `None` for in-memory databases.
    path: Option<PathBuf>,
}

impl Database {
    /// Open the history database in the app data directory.
    pub fn new() -> Result<Self> {
        Self::open(&app_data_dir().join("history.db"))
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        db.init_tables()?;
        log::info!("Opened history database at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: None,
        };
        db.init_tables()?;
        Ok(db)
    }

    fn init_tables(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS conversion_history (
                id                   TEXT PRIMARY KEY,
                input_file_name      TEXT NOT NULL,
                input_format         TEXT NOT NULL,
                output_format        TEXT NOT NULL,
                output_file_name     TEXT NOT NULL,
                output_file_location TEXT NOT NULL,
                timestamp            TEXT NOT NULL,
                file_size_bytes      INTEGER NOT NULL DEFAULT 0,
                thumbnail_data       BLOB
            );

            CREATE INDEX IF NOT EXISTS idx_history_timestamp ON conversion_history(timestamp);
            ",
        )?;
        Ok(())
    }

    /// The connection is only ever left in a valid state, so a poisoned lock
    /// is still usable.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Sub-modules ─────────────────────────────────────────────

mod conversions;
mod models;
mod storage;

// ── Re-exports ──────────────────────────────────────────────

pub use models::HistoryStats;
