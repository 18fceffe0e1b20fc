use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the app data directory: <config dir>/file-converter/
pub fn app_data_dir() -> PathBuf {
    let dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("file-converter");
    fs::create_dir_all(&dir).ok();
    dir
}

pub fn config_path() -> PathBuf {
    app_data_dir().join("config.json")
}

// ── Data types ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: AppSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Keep conversions across restarts instead of only for this session
    #[serde(default)]
    pub save_history: bool,
    /// Where converted files go; `None` writes next to the input
    #[serde(default)]
    pub output_directory: Option<PathBuf>,
    /// Check saved conversions for missing files at startup
    #[serde(default = "default_scan_on_launch")]
    pub scan_on_launch: bool,
}

fn default_scan_on_launch() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            save_history: false,
            output_directory: None,
            scan_on_launch: default_scan_on_launch(),
        }
    }
}

impl AppSettings {
    /// Output directory for a conversion of `input`.
    pub fn output_dir_for(&self, input: &Path) -> PathBuf {
        match &self.output_directory {
            Some(dir) => dir.clone(),
            None => input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

// ── Load / Save ─────────────────────────────────────────────

/// Read a file to string, dropping a leading UTF-8 BOM.
pub fn read_file_strip_bom(path: &Path) -> Result<String, String> {
    let raw = fs::read(path).map_err(|e| format!("Failed to read file: {}", e))?;
    let text = String::from_utf8(raw).map_err(|e| format!("Invalid UTF-8: {}", e))?;
    Ok(text.strip_prefix('\u{FEFF}').unwrap_or(&text).to_string())
}

pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

/// Missing file writes defaults out; unreadable file falls back to defaults.
pub fn load_config_from(path: &Path) -> AppConfig {
    if path.exists() {
        match read_file_strip_bom(path).and_then(|data| {
            serde_json::from_str(&data).map_err(|e| format!("Invalid config: {}", e))
        }) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Using default config, {}: {}", path.display(), e);
                AppConfig::default()
            }
        }
    } else {
        let config = AppConfig::default();
        save_config_to(path, &config).ok();
        config
    }
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), String> {
    let json = serde_json::to_string_pretty(config).map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| e.to_string())?;
    Ok(())
}
