//! Configuration structures and defaults for the downloader.
//!
//! [`DownloaderConfig`] holds everything fixed when the engine is built. The
//! user-tunable values that may change while it runs live in
//! [`Settings`](crate::settings::Settings) instead.
//!
//! # Examples
//!
//! ## Using Callbacks
//!
//! ```rust
//! use fetchq::downloader::DownloadCallback;
//! use fetchq::download::{Task, TaskStatus};
//!
//! let callback: DownloadCallback = Box::new(|task: &Task| match task.status {
//!     TaskStatus::Completed => println!("✓ {} -> {:?}", task.url, task.filename),
//!     _ => println!("✗ {}: {}", task.url, task.error.as_deref().unwrap_or("")),
//! });
//! ```

use crate::download::Task;
use crate::http::HttpClientConfig;
use crate::settings::{JsonFileStore, Settings, SettingsStore};

use std::sync::Arc;
use std::time::Duration;

/// Callback invoked once per task when it reaches a terminal state.
pub type DownloadCallback = Box<dyn Fn(&Task) + Send + Sync>;

/// Configuration structure for the downloader.
#[derive(Clone)]
pub struct DownloaderConfig {
    /// Settings to start with. `None` loads them from `settings_store`.
    pub settings: Option<Settings>,
    /// Where settings updates are persisted.
    pub settings_store: Arc<dyn SettingsStore>,
    /// HTTP client options.
    pub http: HttpClientConfig,
    /// Upper bound on the size probe issued before each attempt.
    pub probe_timeout: Duration,
    /// Length of one retry backoff unit.
    pub backoff_unit: Duration,
    /// Callback for when each task finishes.
    pub on_complete: Option<Arc<DownloadCallback>>,
}

impl std::fmt::Debug for DownloaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloaderConfig")
            .field("settings", &self.settings)
            .field("settings_store", &self.settings_store)
            .field("http", &self.http)
            .field("probe_timeout", &self.probe_timeout)
            .field("backoff_unit", &self.backoff_unit)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            settings: None,
            settings_store: Arc::new(JsonFileStore::default()),
            http: HttpClientConfig::default(),
            probe_timeout: Duration::from_secs(15),
            backoff_unit: Duration::from_secs(1),
            on_complete: None,
        }
    }
}
