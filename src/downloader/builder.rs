//! Builder pattern implementation for creating Downloader instances.
//!
//! # Examples
//!
//! ## Basic Builder Usage
//!
//! ```rust,no_run
//! use fetchq::downloader::DownloaderBuilder;
//! use fetchq::settings::JsonFileStore;
//!
//! # async fn example() -> Result<(), fetchq::Error> {
//! let downloader = DownloaderBuilder::new()
//!     .settings_store(JsonFileStore::new("/etc/fetchq/settings.json"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Fixed Settings and a Completion Callback
//!
//! ```rust,no_run
//! use fetchq::downloader::DownloaderBuilder;
//! use fetchq::download::TaskStatus;
//! use fetchq::settings::{MemorySettingsStore, Settings};
//!
//! # async fn example() -> Result<(), fetchq::Error> {
//! let downloader = DownloaderBuilder::new()
//!     .settings(Settings {
//!         download_folder: "./downloads".into(),
//!         max_concurrent: 4,
//!         ..Settings::default()
//!     })
//!     .settings_store(MemorySettingsStore::new())
//!     .on_complete(|task| {
//!         if task.status == TaskStatus::Error {
//!             eprintln!("{} failed: {:?}", task.url, task.error);
//!         }
//!     })
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use super::config::DownloaderConfig;
use super::downloader::Downloader;
use crate::download::Task;
use crate::error::Result;
use crate::http::HttpClientConfig;
use crate::settings::{Settings, SettingsStore};

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::Proxy;
use std::sync::Arc;
use std::time::Duration;

/// A builder used to create a [`Downloader`].
#[derive(Default)]
pub struct DownloaderBuilder {
    config: DownloaderConfig,
}

impl DownloaderBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        DownloaderBuilder::default()
    }

    /// Starts with these settings instead of loading them from the store.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.config.settings = Some(settings);
        self
    }

    /// Sets where settings are loaded from and persisted to.
    pub fn settings_store<S>(mut self, store: S) -> Self
    where
        S: SettingsStore + 'static,
    {
        self.config.settings_store = Arc::new(store);
        self
    }

    /// Shares an existing settings store.
    pub fn shared_settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.config.settings_store = store;
        self
    }

    /// Replaces the HTTP client options.
    pub fn http_config(mut self, http: HttpClientConfig) -> Self {
        self.config.http = http;
        self
    }

    /// Routes every request through `proxy`.
    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.config.http.proxy = Some(proxy);
        self
    }

    /// Add the http headers.
    ///
    /// Calling `.headers()` several times merges all the maps.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.config
            .http
            .headers
            .get_or_insert_with(HeaderMap::new)
            .extend(headers);
        self
    }

    /// Add the http header.
    ///
    /// ```
    /// use reqwest::header::{self, HeaderValue};
    /// use fetchq::downloader::DownloaderBuilder;
    ///
    /// let ua = HeaderValue::from_static("curl/7.87");
    /// let builder = DownloaderBuilder::new().header(header::USER_AGENT, ua);
    /// ```
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.config
            .http
            .headers
            .get_or_insert_with(HeaderMap::new)
            .insert(name, value);
        self
    }

    /// Bounds the size probe sent before each attempt.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout = timeout;
        self
    }

    /// Sets the length of one retry backoff unit (one second by default).
    pub fn backoff_unit(mut self, unit: Duration) -> Self {
        self.config.backoff_unit = unit;
        self
    }

    /// Set callback for when each task completes or fails for good.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Task) + Send + Sync + 'static,
    {
        self.config.on_complete = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Create the [`Downloader`] with the specified options.
    ///
    /// Must be called from within a Tokio runtime: the dispatch loop is
    /// spawned onto it.
    pub fn build(self) -> Result<Downloader> {
        Downloader::start(self.config)
    }
}
