use crate::config::{self, AppConfig};
use super::AppState;

pub fn get_config(state: &AppState) -> Result<AppConfig, String> {
    let config = state.config.lock().map_err(|e| e.to_string())?;
    Ok(config.clone())
}

pub fn save_config_cmd(state: &AppState, new_config: AppConfig) -> Result<(), String> {
    config::save_config_to(&state.config_path, &new_config)?;
    let mut config = state.config.lock().map_err(|e| e.to_string())?;
    *config = new_config;
    Ok(())
}

/// Switch between the session list and the saved history.
/// Neither list is cleared by switching.
pub fn set_save_history(state: &AppState, enabled: bool) -> Result<(), String> {
    let mut config = state.config.lock().map_err(|e| e.to_string())?;
    let mut updated = config.clone();
    updated.settings.save_history = enabled;
    config::save_config_to(&state.config_path, &updated)?;
    *config = updated;
    log::info!(
        "History mode: {}",
        if enabled { "saved" } else { "session only" }
    );
    Ok(())
}
