//! Conversion history and background conversion plumbing for the file
//! converter app. The UI drives everything through [`commands`].

pub mod commands;
pub mod config;
pub mod convert;
pub mod db;
pub mod history;

pub use commands::AppState;
pub use convert::{ConversionEngine, ConversionError, ConversionOutcome, ConversionRequest};
pub use db::Database;
pub use history::{
    ConversionRecord, FileShell, HistoryChange, HistoryError, PersistentHistoryStore,
    RecordStore, SystemShell, VolatileHistoryTracker,
};

/// Initialise logging, load config, open the history database.
pub fn bootstrap() -> Result<AppState, String> {
    // Ignore a second init, e.g. from tests.
    let _ = env_logger::try_init();

    let app_config = config::load_config();
    let database = Database::new().map_err(|e| format!("Failed to open history database: {}", e))?;
    let state = AppState::open(app_config, config::config_path(), database)?;
    log::info!(
        "File converter ready ({} saved conversions)",
        state.saved.lock().map_err(|e| e.to_string())?.len()
    );
    Ok(state)
}
