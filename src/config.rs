// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor configuration.
//!
//! Read from `$HARBORLABEL_CONFIG` if set, otherwise from
//! `<config dir>/harborlabel/config.yaml`. Every field is optional.

use crate::io::persistence::{DEFAULT_BACKUP_KEY, DEFAULT_SAVE_DELAY};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "HARBORLABEL_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period before a change is saved, in milliseconds.
    pub save_delay_ms: u64,
    /// Directory of the local backup store. Defaults to the platform data dir.
    pub backup_dir: Option<PathBuf>,
    pub backup_key: String,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            save_delay_ms: DEFAULT_SAVE_DELAY.as_millis() as u64,
            backup_dir: None,
            backup_key: DEFAULT_BACKUP_KEY.to_string(),
            window_width: 1280.0,
            window_height: 720.0,
        }
    }
}

impl EditorConfig {
    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_delay_ms)
    }

    /// Configured backup directory, or `<data dir>/harborlabel`, or the
    /// working directory when no data dir is known.
    pub fn resolved_backup_dir(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("harborlabel")))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }
}

pub fn config_path() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => Some(PathBuf::from(path)),
        None => dirs::config_dir().map(|dir| dir.join("harborlabel").join("config.yaml")),
    }
}

/// Load configuration, falling back to defaults when the file is missing or
/// unusable.
pub fn load_config() -> EditorConfig {
    let Some(path) = config_path() else {
        return EditorConfig::default();
    };
    if !path.exists() {
        return EditorConfig::default();
    }
    match EditorConfig::from_file(&path) {
        Ok(config) => {
            log::info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("Using default config: {:#}", e);
            EditorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "save_delay_ms: 1000\nbackup_dir: /tmp/hl\n").unwrap();

        let config = EditorConfig::from_file(&path).unwrap();
        assert_eq!(config.save_delay(), Duration::from_millis(1000));
        assert_eq!(config.resolved_backup_dir(), PathBuf::from("/tmp/hl"));
        assert_eq!(config.backup_key, DEFAULT_BACKUP_KEY);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "save_delay_ms: [oops").unwrap();
        assert!(EditorConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_default_delay() {
        assert_eq!(EditorConfig::default().save_delay(), DEFAULT_SAVE_DELAY);
    }
}
