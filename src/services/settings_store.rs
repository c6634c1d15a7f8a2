//! Key-value settings store backed by a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::types::Settings;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored settings, or defaults when nothing has been saved yet.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Persist via a temporary sibling file renamed into place.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(settings)?;

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        info!("Settings saved to {}", self.path.display());
        Ok(())
    }

    /// Single value by its JSON key, e.g. `"minConfidence"`.
    pub fn get(&self, key: &str) -> Result<Option<serde_json::Value>, SettingsError> {
        let value = serde_json::to_value(self.load()?)?;
        Ok(value.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_defaults_when_absent() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let settings = Settings {
            min_confidence: 85,
            enable_auto_trading: true,
            alpaca_api_key: "PKTEST1234".to_string(),
            ..Default::default()
        };

        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
        assert!(!dir.path().join("settings.json.tmp").exists());
    }

    #[test]
    fn test_get_by_key() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        store
            .save(&Settings {
                max_trades_per_day: 3,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(
            store.get("maxTradesPerDay").unwrap(),
            Some(serde_json::json!(3))
        );
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2").unwrap();
        let store = SettingsStore::new(path);
        assert!(matches!(store.load(), Err(SettingsError::Json(_))));
    }
}
