use serde::Deserialize;
use std::fs;

const SETTINGS_FILENAME: &str = "settings.json";

/// Server settings, loaded from settings.json next to the binary.
/// Missing file means defaults; a present-but-broken file is an error so a
/// typo doesn't silently boot with the wrong database.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_address: String,
    pub port: u16,
    pub database_path: String,
    pub static_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            database_path: "taskbox.redb".to_string(),
            static_dir: "frontend/dist".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Settings, SettingsError> {
        match fs::read_to_string(SETTINGS_FILENAME) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(SettingsError::Io(e.to_string())),
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "settings: {e}"),
            SettingsError::Parse(e) => write!(f, "settings: invalid {SETTINGS_FILENAME}: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {}
