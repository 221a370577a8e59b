//! fetchq is a crate for queueing HTTP(S) downloads and running them in the
//! background, with bounded concurrency, resume on retry and live progress.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fetchq::{DownloaderBuilder, Error};
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let downloader = DownloaderBuilder::new().build()?;
//! let id = downloader
//!     .enqueue("https://example.com/videos/intro.mp4")
//!     .await?;
//!
//! let mut status = downloader.subscribe_status();
//! while let Some(snapshot) = status.next().await {
//!     let task = &snapshot[&id];
//!     println!("{} {:?}", task.status, task.progress);
//!     if task.status.is_terminal() {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! The fetchq crate is organized into several modules:
//!
//! - [`download`] - Task records, their status and the shared task store
//! - [`downloader`] - The `Downloader` engine and `DownloaderBuilder`
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`http`] - HTTP client construction
//! - [`progress`] - Change-driven status snapshots for observers
//! - [`settings`] - Runtime settings, validation and persistence
//! - [`utils`] - Shared utility functions

pub mod download;
pub mod downloader;
pub mod error;
pub mod http;
pub mod progress;
pub mod settings;
pub mod utils;

pub use download::{Snapshot, Task, TaskStatus, TaskStore};
pub use downloader::{BulkEnqueued, Downloader, DownloaderBuilder};
pub use error::{Error, Result};
pub use http::{create_http_client, HttpClientConfig};
pub use progress::StatusStream;
pub use settings::{JsonFileStore, MemorySettingsStore, Settings, SettingsPatch, SettingsStore};
pub use utils::urls_from_json;
