use std::path::Path;

use rusqlite::Result;

use super::models::HistoryStats;
use super::Database;

impl Database {
    /// On-disk size of the database file in bytes (0 when in memory).
    pub fn get_db_file_size(&self) -> u64 {
        self.path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Row count plus how many saved outputs are still on disk.
    pub fn stats(&self) -> Result<HistoryStats> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT output_file_location FROM conversion_history")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut record_count = 0u64;
        let mut accessible_count = 0u64;
        for location in rows {
            record_count += 1;
            if Path::new(&location?).is_file() {
                accessible_count += 1;
            }
        }

        Ok(HistoryStats {
            record_count,
            accessible_count,
            db_size_bytes: self.get_db_file_size(),
        })
    }

    /// Reclaim space after large deletions.
    pub fn vacuum(&self) -> Result<()> {
        self.conn().execute_batch("VACUUM")
    }
}
