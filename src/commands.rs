//! The command surface the UI calls. Every command returns `Result<_, String>`.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::db::Database;
use crate::history::{PersistentHistoryStore, VolatileHistoryTracker};

mod config_cmds;
mod convert_cmds;
mod history_cmds;

pub use config_cmds::{get_config, save_config_cmd, set_save_history};
pub use convert_cmds::convert_file;
pub use history_cmds::{
    clear_history, clear_missing_files, compact_history, get_history, get_history_stats, has_missing_files,
    open_history_file, record_conversion, remove_history_entry, reveal_history_file,
    scan_missing_files,
};

pub struct AppState {
    pub config: Arc<Mutex<AppConfig>>,
    pub config_path: PathBuf,
    pub recent: Mutex<VolatileHistoryTracker>,
    pub saved: Mutex<PersistentHistoryStore<Database>>,
}

impl AppState {
    /// Open the saved history and, if configured, scan it for missing files.
    pub fn open(config: AppConfig, config_path: PathBuf, db: Database) -> Result<Self, String> {
        let mut saved = PersistentHistoryStore::open(db).map_err(|e| e.to_string())?;
        if config.settings.scan_on_launch {
            saved.scan_for_missing_files();
        }

        Ok(Self {
            config: Arc::new(Mutex::new(config)),
            config_path,
            recent: Mutex::new(VolatileHistoryTracker::new()),
            saved: Mutex::new(saved),
        })
    }

    /// Whether commands go to the saved history rather than the session list.
    pub fn saves_history(&self) -> Result<bool, String> {
        let config = self.config.lock().map_err(|e| e.to_string())?;
        Ok(config.settings.save_history)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::Path;

    pub(crate) fn state_in(dir: &Path, save_history: bool) -> AppState {
        let mut config = AppConfig::default();
        config.settings.save_history = save_history;
        let db = Database::open(&dir.join("history.db")).unwrap();
        AppState::open(config, dir.join("config.json"), db).unwrap()
    }

    #[test]
    fn test_launch_scan_flags_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("gone.pdf");
        {
            let state = state_in(dir.path(), true);
            std::fs::write(&out, b"pdf").unwrap();
            record_conversion(&state, "gone.md", "markdown", "pdf", &out).unwrap();
        }
        std::fs::remove_file(&out).unwrap();

        let state = state_in(dir.path(), true);
        assert!(has_missing_files(&state).unwrap());
        assert_eq!(get_history(&state).unwrap().len(), 1);
    }
}
