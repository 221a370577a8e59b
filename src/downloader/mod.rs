//! Downloader module containing the engine, its builder and configuration.
//!
//! This module provides the main [`Downloader`] struct and its associated
//! builder pattern. It accepts download requests, runs each one as a
//! background transfer bounded by a resizable concurrency gate, and retries
//! failed transfers with capped exponential backoff.
//!
//! # Overview
//!
//! - `downloader` - Core Downloader struct: intake, dispatch loop, settings
//! - `builder` - DownloaderBuilder for flexible configuration
//! - `config` - Configuration structures and callback types
//! - `executor` - One task's transfer, from gate slot to terminal state
//! - `gate` - Resizable concurrency bound
//! - `retry` - Retry decisions and backoff delays
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use fetchq::downloader::DownloaderBuilder;
//!
//! # async fn example() -> Result<(), fetchq::Error> {
//! let downloader = DownloaderBuilder::new().build()?;
//!
//! let queued = downloader
//!     .bulk_enqueue(&[
//!         "https://example.com/file1.mp4",
//!         "https://example.com/file2.pdf",
//!     ])
//!     .await?;
//! println!("{} downloads queued", queued.count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Advanced Configuration
//!
//! ```rust,no_run
//! use fetchq::downloader::DownloaderBuilder;
//! use fetchq::settings::{JsonFileStore, Settings};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), fetchq::Error> {
//! let downloader = DownloaderBuilder::new()
//!     .settings_store(JsonFileStore::new("./fetchq.json"))
//!     .probe_timeout(Duration::from_secs(5))
//!     .on_complete(|task| {
//!         println!("{}: {}", task.url, task.status);
//!     })
//!     .build()?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod downloader;
mod executor;
pub mod gate;
pub mod retry;

pub use builder::DownloaderBuilder;
pub use config::{DownloadCallback, DownloaderConfig};
pub use downloader::{BulkEnqueued, Downloader};
pub use gate::{ConcurrencyGate, GatePermit};
pub use retry::{RetryDecision, RetryPolicy};
