//! RON settings loader
//!
//! Loads tuning from `assets/data/settings.ron`, with fallback to the
//! built-in defaults.

use std::fs;
use std::path::Path;

use thiserror::Error;

use super::settings::GameSettings;

/// Default directory holding data files
pub const DATA_DIR: &str = "assets/data";

const SETTINGS_FILE: &str = "settings.ron";

/// Errors that can occur while reading or writing data files
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file '{path}': {details}")]
    ReadError { path: String, details: String },

    #[error("Parse error in '{path}': {details}")]
    ParseError { path: String, details: String },

    #[error("Failed to write file '{path}': {details}")]
    WriteError { path: String, details: String },
}

/// Read settings from `base_path`, failing on any problem
pub fn try_load_settings(base_path: &Path) -> Result<GameSettings, DataLoadError> {
    let path = base_path.join(SETTINGS_FILE);
    let display = path.display().to_string();

    if !path.exists() {
        return Err(DataLoadError::FileNotFound(display));
    }

    let content = fs::read_to_string(&path).map_err(|e| DataLoadError::ReadError {
        path: display.clone(),
        details: e.to_string(),
    })?;

    ron::from_str(&content).map_err(|e| DataLoadError::ParseError {
        path: display,
        details: e.to_string(),
    })
}

/// Load settings, falling back to defaults when the file is missing or broken
pub fn load_settings(base_path: &Path) -> GameSettings {
    match try_load_settings(base_path) {
        Ok(settings) => {
            log::info!("Settings loaded from {:?}", base_path.join(SETTINGS_FILE));
            settings
        }
        Err(DataLoadError::FileNotFound(path)) => {
            log::info!("No settings at {}, using defaults", path);
            GameSettings::default()
        }
        Err(e) => {
            log::warn!("{}. Using default settings.", e);
            GameSettings::default()
        }
    }
}

/// Write the default settings so they can be edited by hand
pub fn export_default_settings(base_path: &Path) -> Result<(), DataLoadError> {
    let path = base_path.join(SETTINGS_FILE);
    let display = path.display().to_string();

    fs::create_dir_all(base_path).map_err(|e| DataLoadError::WriteError {
        path: base_path.display().to_string(),
        details: e.to_string(),
    })?;

    let ron = ron::ser::to_string_pretty(&GameSettings::default(), ron::ser::PrettyConfig::default())
        .map_err(|e| DataLoadError::WriteError {
            path: display.clone(),
            details: e.to_string(),
        })?;

    fs::write(&path, ron).map_err(|e| DataLoadError::WriteError {
        path: display,
        details: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bible-heroes-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_export_then_load_default_settings() {
        let dir = scratch_dir("export");
        let result = export_default_settings(&dir);
        assert!(result.is_ok(), "Failed to export settings: {:?}", result.err());
        assert!(dir.join("settings.ron").exists(), "settings.ron not created");

        let loaded = try_load_settings(&dir).unwrap();
        assert_eq!(loaded, GameSettings::default());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = scratch_dir("missing");
        assert!(matches!(try_load_settings(&dir), Err(DataLoadError::FileNotFound(_))));
        assert_eq!(load_settings(&dir), GameSettings::default());
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let dir = scratch_dir("broken");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("settings.ron"), "(runner: [not a struct").unwrap();

        assert!(matches!(try_load_settings(&dir), Err(DataLoadError::ParseError { .. })));
        assert_eq!(load_settings(&dir), GameSettings::default());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_shipped_settings_match_defaults() {
        let shipped = try_load_settings(Path::new(env!("CARGO_MANIFEST_DIR")).join(DATA_DIR).as_path()).unwrap();
        assert_eq!(shipped, GameSettings::default());
    }
}
