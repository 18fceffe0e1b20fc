use std::path::Path;

use crate::db::HistoryStats;
use crate::history::ConversionRecord;
use super::AppState;

/// The active history, newest first.
pub fn get_history(state: &AppState) -> Result<Vec<ConversionRecord>, String> {
    if state.saves_history()? {
        let saved = state.saved.lock().map_err(|e| e.to_string())?;
        Ok(saved.records().to_vec())
    } else {
        let recent = state.recent.lock().map_err(|e| e.to_string())?;
        Ok(recent.records().to_vec())
    }
}

/// Log a successful conversion in whichever history is active.
pub fn record_conversion(
    state: &AppState,
    input_file_name: &str,
    input_format: &str,
    output_format: &str,
    output_file_location: &Path,
) -> Result<ConversionRecord, String> {
    if state.saves_history()? {
        let mut saved = state.saved.lock().map_err(|e| e.to_string())?;
        saved
            .record(input_file_name, input_format, output_format, output_file_location)
            .map_err(|e| e.to_string())
    } else {
        let mut recent = state.recent.lock().map_err(|e| e.to_string())?;
        Ok(recent.record(input_file_name, input_format, output_format, output_file_location))
    }
}

/// Remove one entry by id. Unknown ids are not an error.
pub fn remove_history_entry(state: &AppState, record_id: &str) -> Result<bool, String> {
    if state.saves_history()? {
        let mut saved = state.saved.lock().map_err(|e| e.to_string())?;
        let Some(record) = saved.records().iter().find(|r| r.id == record_id).cloned() else {
            return Ok(false);
        };
        saved.remove(&record).map_err(|e| e.to_string())
    } else {
        let mut recent = state.recent.lock().map_err(|e| e.to_string())?;
        let Some(record) = recent.records().iter().find(|r| r.id == record_id).cloned() else {
            return Ok(false);
        };
        Ok(recent.remove(&record))
    }
}

pub fn clear_history(state: &AppState) -> Result<(), String> {
    if state.saves_history()? {
        let mut saved = state.saved.lock().map_err(|e| e.to_string())?;
        saved.clear_all().map_err(|e| e.to_string())?;
    } else {
        let mut recent = state.recent.lock().map_err(|e| e.to_string())?;
        recent.clear();
    }
    Ok(())
}

// ── Missing files (saved history only) ──────────────────────

pub fn scan_missing_files(state: &AppState) -> Result<usize, String> {
    let mut saved = state.saved.lock().map_err(|e| e.to_string())?;
    Ok(saved.scan_for_missing_files())
}

pub fn has_missing_files(state: &AppState) -> Result<bool, String> {
    let saved = state.saved.lock().map_err(|e| e.to_string())?;
    Ok(saved.has_missing_files())
}

pub fn clear_missing_files(state: &AppState) -> Result<usize, String> {
    let mut saved = state.saved.lock().map_err(|e| e.to_string())?;
    saved.clear_missing_files().map_err(|e| e.to_string())
}

/// `Ok(false)` when the entry is unknown or its file is gone.
pub fn open_history_file(state: &AppState, record_id: &str) -> Result<bool, String> {
    let saved = state.saved.lock().map_err(|e| e.to_string())?;
    match saved.records().iter().find(|r| r.id == record_id) {
        Some(record) => saved.open_file(record).map_err(|e| e.to_string()),
        None => Ok(false),
    }
}

/// `Ok(false)` when the entry is unknown or its file is gone.
pub fn reveal_history_file(state: &AppState, record_id: &str) -> Result<bool, String> {
    let saved = state.saved.lock().map_err(|e| e.to_string())?;
    match saved.records().iter().find(|r| r.id == record_id) {
        Some(record) => saved.reveal_in_finder(record).map_err(|e| e.to_string()),
        None => Ok(false),
    }
}

pub fn get_history_stats(state: &AppState) -> Result<HistoryStats, String> {
    let saved = state.saved.lock().map_err(|e| e.to_string())?;
    saved.store().stats().map_err(|e| e.to_string())
}

/// Compact the database after clearing.
pub fn compact_history(state: &AppState) -> Result<(), String> {
    let saved = state.saved.lock().map_err(|e| e.to_string())?;
    if saved.is_empty() {
        saved.store().vacuum().map_err(|e| e.to_string())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::state_in;

    #[test]
    fn test_session_mode_does_not_touch_saved() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a.pdf");
        std::fs::write(&out, b"pdf").unwrap();
        let state = state_in(dir.path(), false);

        let r = record_conversion(&state, "a.md", "markdown", "pdf", &out).unwrap();
        assert_eq!(get_history(&state).unwrap(), vec![r.clone()]);
        assert_eq!(get_history_stats(&state).unwrap().record_count, 0);

        assert!(remove_history_entry(&state, &r.id).unwrap());
        assert!(!remove_history_entry(&state, &r.id).unwrap());
        assert!(get_history(&state).unwrap().is_empty());
    }

    #[test]
    fn test_saved_mode_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a.pdf");
        std::fs::write(&out, b"pdf").unwrap();
        let state = state_in(dir.path(), true);

        let r = record_conversion(&state, "a.md", "markdown", "pdf", &out).unwrap();
        let stats = get_history_stats(&state).unwrap();
        assert_eq!(stats.record_count, 1);
        assert_eq!(stats.accessible_count, 1);

        assert!(open_history_file(&state, "unknown").is_ok_and(|opened| !opened));
        assert!(reveal_history_file(&state, "unknown").is_ok_and(|shown| !shown));

        std::fs::remove_file(&out).unwrap();
        assert!(!open_history_file(&state, &r.id).unwrap());
        assert_eq!(scan_missing_files(&state).unwrap(), 1);
        assert!(has_missing_files(&state).unwrap());
        assert_eq!(clear_missing_files(&state).unwrap(), 1);
        assert!(!has_missing_files(&state).unwrap());
        assert!(get_history(&state).unwrap().is_empty());
    }

    #[test]
    fn test_clear_history_and_compact() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a.pdf");
        let state = state_in(dir.path(), true);
        for _ in 0..3 {
            record_conversion(&state, "a.md", "markdown", "pdf", &out).unwrap();
        }

        clear_history(&state).unwrap();
        compact_history(&state).unwrap();
        assert!(get_history(&state).unwrap().is_empty());
        assert_eq!(get_history_stats(&state).unwrap().record_count, 0);
    }
}
