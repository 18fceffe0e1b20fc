use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Row};

use super::Database;
use crate::history::{ConversionRecord, HistoryError, RecordStore};

/// Fixed-width UTC so that text order matches time order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

const SELECT_COLUMNS: &str = "SELECT id, input_file_name, input_format, output_format, output_file_name,
        output_file_location, timestamp, file_size_bytes, thumbnail_data
 FROM conversion_history";

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ConversionRecord> {
    let timestamp: String = row.get(6)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);
    let location: String = row.get(5)?;
    let size: i64 = row.get(7)?;

    Ok(ConversionRecord {
        id: row.get(0)?,
        input_file_name: row.get(1)?,
        input_format: row.get(2)?,
        output_format: row.get(3)?,
        output_file_name: row.get(4)?,
        output_file_location: PathBuf::from(location),
        timestamp,
        file_size_bytes: size.max(0) as u64,
        thumbnail_data: row.get(8)?,
    })
}

impl RecordStore for Database {
    fn insert(&self, record: &ConversionRecord) -> Result<(), HistoryError> {
        let size = record.file_size_bytes as i64;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO conversion_history (id, input_file_name, input_format, output_format, output_file_name,
                output_file_location, timestamp, file_size_bytes, thumbnail_data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id,
                record.input_file_name,
                record.input_format,
                record.output_format,
                record.output_file_name,
                record.output_file_location.to_string_lossy(),
                format_timestamp(&record.timestamp),
                size,
                record.thumbnail_data,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool, HistoryError> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM conversion_history WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn delete_many(&self, ids: &[String]) -> Result<usize, HistoryError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut deleted = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM conversion_history WHERE id = ?1")?;
            for id in ids {
                deleted += stmt.execute(params![id])?;
            }
        }
        tx.commit()?;
        Ok(deleted)
    }

    fn delete_all(&self) -> Result<usize, HistoryError> {
        let conn = self.conn();
        Ok(conn.execute("DELETE FROM conversion_history", [])?)
    }

    fn enumerate_all(&self) -> Result<Vec<ConversionRecord>, HistoryError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY timestamp DESC, rowid DESC",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map([], record_from_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}
