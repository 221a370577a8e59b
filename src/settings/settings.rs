//! The process-wide configuration document and its validation rules.

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

/// Accepted values for `max_concurrent`.
pub const MAX_CONCURRENT_RANGE: RangeInclusive<i64> = 1..=10;
/// Accepted values for `max_retries`.
pub const MAX_RETRIES_RANGE: RangeInclusive<i64> = 1..=20;
/// Accepted values for `download_timeout`, in seconds.
pub const DOWNLOAD_TIMEOUT_RANGE: RangeInclusive<i64> = 30..=300;
/// Accepted values for `chunk_size`, in KB.
pub const CHUNK_SIZE_RANGE: RangeInclusive<i64> = 16..=1024;

/// Runtime configuration.
///
/// Serialized as a flat document with exactly these six keys. Keys missing
/// from a stored document take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory new files are written to.
    pub download_folder: PathBuf,
    /// How many transfers may run at once.
    pub max_concurrent: usize,
    /// Retries allowed after the first attempt fails.
    pub max_retries: u32,
    /// Seconds to wait for response headers or the next body chunk.
    pub download_timeout: u64,
    /// Largest piece written to disk per progress update, in KB.
    pub chunk_size: usize,
    /// UI theme flag, stored but not interpreted.
    pub auto_dark_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            download_folder: PathBuf::from("./downloads"),
            max_concurrent: 2,
            max_retries: 10,
            download_timeout: 60,
            chunk_size: 64,
            auto_dark_mode: false,
        }
    }
}

impl Settings {
    /// `download_timeout` as a [`Duration`].
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout)
    }

    /// `chunk_size` converted to bytes.
    pub fn chunk_size_bytes(&self) -> usize {
        self.chunk_size * 1024
    }

    /// Checks every field against its constraint.
    pub fn validate(&self) -> Result<()> {
        SettingsPatch::from(self).validate()
    }

    /// Builds the configuration that results from applying `patch`.
    ///
    /// Either every present field is valid and a new value is returned, or
    /// nothing is applied.
    pub fn apply(&self, patch: &SettingsPatch) -> Result<Settings> {
        patch.validate()?;

        let mut next = self.clone();
        if let Some(folder) = &patch.download_folder {
            next.download_folder = PathBuf::from(folder);
        }
        if let Some(v) = patch.max_concurrent {
            next.max_concurrent = v as usize;
        }
        if let Some(v) = patch.max_retries {
            next.max_retries = v as u32;
        }
        if let Some(v) = patch.download_timeout {
            next.download_timeout = v as u64;
        }
        if let Some(v) = patch.chunk_size {
            next.chunk_size = v as usize;
        }
        if let Some(v) = patch.auto_dark_mode {
            next.auto_dark_mode = v;
        }
        Ok(next)
    }
}

/// A partial settings update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub download_folder: Option<String>,
    pub max_concurrent: Option<i64>,
    pub max_retries: Option<i64>,
    pub download_timeout: Option<i64>,
    pub chunk_size: Option<i64>,
    pub auto_dark_mode: Option<bool>,
}

impl SettingsPatch {
    /// Reads a patch from a JSON object.
    ///
    /// Unknown keys are ignored. A known key holding a value of the wrong
    /// type, `null` included, rejects the whole document.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            Error::InvalidSettings("settings update must be a JSON object".to_string())
        })?;

        Ok(Self {
            download_folder: string_field(object, "download_folder", "Invalid download folder")?,
            max_concurrent: integer_field(
                object,
                "max_concurrent",
                "Max concurrent must be an integer",
            )?,
            max_retries: integer_field(object, "max_retries", "Max retries must be an integer")?,
            download_timeout: integer_field(
                object,
                "download_timeout",
                "Download timeout must be an integer",
            )?,
            chunk_size: integer_field(object, "chunk_size", "Chunk size must be an integer")?,
            auto_dark_mode: bool_field(object, "auto_dark_mode", "Auto dark mode must be boolean")?,
        })
    }

    /// Checks every present field against its constraint.
    pub fn validate(&self) -> Result<()> {
        if let Some(folder) = &self.download_folder {
            if folder.trim().is_empty() {
                return Err(Error::InvalidSettings("Invalid download folder".to_string()));
            }
        }
        check_range(
            self.max_concurrent,
            MAX_CONCURRENT_RANGE,
            "Max concurrent must be between 1 and 10",
        )?;
        check_range(
            self.max_retries,
            MAX_RETRIES_RANGE,
            "Max retries must be between 1 and 20",
        )?;
        check_range(
            self.download_timeout,
            DOWNLOAD_TIMEOUT_RANGE,
            "Download timeout must be between 30 and 300 seconds",
        )?;
        check_range(
            self.chunk_size,
            CHUNK_SIZE_RANGE,
            "Chunk size must be between 16 and 1024 KB",
        )?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<&Settings> for SettingsPatch {
    fn from(settings: &Settings) -> Self {
        Self {
            download_folder: Some(settings.download_folder.to_string_lossy().into_owned()),
            max_concurrent: Some(i64::try_from(settings.max_concurrent).unwrap_or(i64::MAX)),
            max_retries: Some(i64::from(settings.max_retries)),
            download_timeout: Some(i64::try_from(settings.download_timeout).unwrap_or(i64::MAX)),
            chunk_size: Some(i64::try_from(settings.chunk_size).unwrap_or(i64::MAX)),
            auto_dark_mode: Some(settings.auto_dark_mode),
        }
    }
}

fn check_range(value: Option<i64>, range: RangeInclusive<i64>, message: &str) -> Result<()> {
    match value {
        Some(v) if !range.contains(&v) => Err(Error::InvalidSettings(message.to_string())),
        _ => Ok(()),
    }
}

fn string_field(object: &Map<String, Value>, key: &str, message: &str) -> Result<Option<String>> {
    match object.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::InvalidSettings(message.to_string())),
    }
}

fn integer_field(object: &Map<String, Value>, key: &str, message: &str) -> Result<Option<i64>> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| Error::InvalidSettings(message.to_string())),
    }
}

fn bool_field(object: &Map<String, Value>, key: &str, message: &str) -> Result<Option<bool>> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| Error::InvalidSettings(message.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(update: Value) -> Result<Settings> {
        Settings::default().apply(&SettingsPatch::from_json(&update)?)
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_concurrent, 2);
        assert_eq!(settings.max_retries, 10);
        assert_eq!(settings.download_timeout, 60);
        assert_eq!(settings.chunk_size_bytes(), 64 * 1024);
        assert_eq!(settings.download_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_apply_partial_update() {
        let next = apply(json!({ "max_concurrent": 5, "auto_dark_mode": true })).unwrap();
        assert_eq!(next.max_concurrent, 5);
        assert!(next.auto_dark_mode);
        assert_eq!(next.max_retries, Settings::default().max_retries);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let next = apply(json!({ "colour": "blue", "chunk_size": 128 })).unwrap();
        assert_eq!(next.chunk_size, 128);
    }

    #[test]
    fn test_range_bounds() {
        assert!(apply(json!({ "max_concurrent": 0 })).is_err());
        assert!(apply(json!({ "max_concurrent": 11 })).is_err());
        assert!(apply(json!({ "max_concurrent": 1 })).is_ok());
        assert!(apply(json!({ "max_concurrent": 10 })).is_ok());
        assert!(apply(json!({ "max_retries": 0 })).is_err());
        assert!(apply(json!({ "max_retries": 21 })).is_err());
        assert!(apply(json!({ "download_timeout": 29 })).is_err());
        assert!(apply(json!({ "download_timeout": 301 })).is_err());
        assert!(apply(json!({ "chunk_size": 15 })).is_err());
        assert!(apply(json!({ "chunk_size": 1025 })).is_err());
    }

    #[test]
    fn test_wrong_types_are_rejected() {
        assert!(apply(json!({ "max_concurrent": "3" })).is_err());
        assert!(apply(json!({ "max_concurrent": 2.5 })).is_err());
        assert!(apply(json!({ "max_retries": null })).is_err());
        assert!(apply(json!({ "auto_dark_mode": 1 })).is_err());
        assert!(apply(json!({ "download_folder": 7 })).is_err());
        assert!(apply(json!({ "download_folder": "   " })).is_err());
        assert!(apply(json!(["max_concurrent", 3])).is_err());
    }

    #[test]
    fn test_one_bad_field_rejects_everything() {
        let result = apply(json!({ "max_concurrent": 4, "chunk_size": 4096 }));
        match result {
            Err(Error::InvalidSettings(message)) => {
                assert_eq!(message, "Chunk size must be between 16 and 1024 KB")
            }
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_stored_document_fills_missing_keys() {
        let settings: Settings =
            serde_json::from_value(json!({ "max_concurrent": 7, "extra": 1 })).unwrap();
        assert_eq!(settings.max_concurrent, 7);
        assert_eq!(settings.chunk_size, 64);
    }

    #[test]
    fn test_serialized_document_has_six_keys() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 6);
        assert_eq!(value["download_folder"], "./downloads");
    }

    #[test]
    fn test_empty_patch() {
        assert!(SettingsPatch::default().is_empty());
        assert!(!SettingsPatch::from_json(&json!({ "chunk_size": 32 }))
            .unwrap()
            .is_empty());
    }
}
