use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::domain::settings::Settings;
use crate::error::{AppError, AppResult};

const APP_DIR_NAME: &str = "swipe";
const SETTINGS_FILE_NAME: &str = "settings.json";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_STATIC_DIR: &str = "client/build";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
}

impl ServerConfig {
    pub fn new(port: u16, static_dir: PathBuf) -> Self {
        Self { port, static_dir }
    }

    /// Reads `PORT` and `SWIPE_STATIC_DIR`; explicit overrides win.
    pub fn load(port: Option<u16>, static_dir: Option<PathBuf>) -> AppResult<Self> {
        let port = match port {
            Some(port) => port,
            None => parse_port(env::var("PORT").ok().as_deref())?,
        };
        let static_dir = static_dir
            .or_else(|| env::var_os("SWIPE_STATIC_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));
        Ok(Self::new(port, static_dir))
    }
}

fn parse_port(value: Option<&str>) -> AppResult<u16> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(DEFAULT_PORT),
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|err| AppError::Configuration(format!("invalid PORT '{raw}': {err}"))),
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    if let Some(dir) = env::var_os("SWIPE_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| AppError::Configuration("unable to locate a config directory".to_string()))
}

pub fn settings_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(SETTINGS_FILE_NAME))
}

/// Persisted settings blob. Last write wins; there is no cross-process locking.
pub struct SettingsStore {
    file_path: PathBuf,
}

impl SettingsStore {
    pub fn open() -> AppResult<Self> {
        Ok(Self::at(settings_file_path()?))
    }

    pub fn at(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Missing or unreadable settings fall back to defaults.
    pub fn load(&self) -> Settings {
        match fs::read_to_string(&self.file_path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(path = %self.file_path.display(), error = %err, "ignoring malformed settings file");
                Settings::default()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Settings::default(),
            Err(err) => {
                warn!(path = %self.file_path.display(), error = %err, "unable to read settings file");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> AppResult<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(settings)
            .map_err(|err| AppError::Configuration(format!("failed to write settings: {err}")))?;
        fs::write(&self.file_path, data)?;
        Ok(())
    }
}
