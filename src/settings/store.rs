//! Durable storage for [`Settings`].

use super::settings::Settings;
use crate::error::Result;

use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Where the settings document is persisted.
pub trait SettingsStore: Debug + Send + Sync {
    /// Reads the stored document, `None` if nothing was stored yet.
    fn load(&self) -> Result<Option<Settings>>;

    /// Replaces the stored document.
    fn save(&self, settings: &Settings) -> io::Result<()>;
}

/// Stores settings as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// File name used when no path is given.
    pub const DEFAULT_PATH: &'static str = "settings.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PATH)
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Option<Settings>> {
        if !self.path.exists() {
            debug!("No settings file at {:?}", self.path);
            return Ok(None);
        }
        let raw = std::fs::read(&self.path)?;
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn save(&self, settings: &Settings) -> io::Result<()> {
        let raw = serde_json::to_vec_pretty(settings)?;
        std::fs::write(&self.path, raw)?;
        debug!("Settings written to {:?}", self.path);
        Ok(())
    }
}

/// Keeps settings in memory only.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    stored: Mutex<Option<Settings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts out holding `settings`.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            stored: Mutex::new(Some(settings)),
        }
    }

    /// The last saved document.
    pub fn stored(&self) -> Option<Settings> {
        self.stored.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<Settings>> {
        Ok(self.stored())
    }

    fn save(&self, settings: &Settings) -> io::Result<()> {
        *self.stored.lock().unwrap_or_else(|e| e.into_inner()) = Some(settings.clone());
        Ok(())
    }
}
