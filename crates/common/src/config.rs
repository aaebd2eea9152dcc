//! Configuration file location, JSON persistence, and logging settings.
//!
//! Typed tracking configuration lives in `gimbal-control-model`; this module
//! only knows where config files live and how to read and write them.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{GimbalError, GimbalResult};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "gimbal_tracker=trace,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("gimbal").join("config.json")
}

/// Read and parse a JSON file, reporting a missing file distinctly.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> GimbalResult<T> {
    if !path.exists() {
        return Err(GimbalError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Read a JSON file, falling back to `T::default()` when it is missing
/// or unreadable. Problems other than absence are logged.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json(path) {
        Ok(value) => value,
        Err(GimbalError::FileNotFound { .. }) => T::default(),
        Err(e) => {
            tracing::warn!("Failed to load config at {:?}: {}", path, e);
            T::default()
        }
    }
}

/// Write a value as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> GimbalResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}
