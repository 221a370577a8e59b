//! Live task progress for observers.
//!
//! Progress itself is recorded on each [`Task`](crate::download::Task) by the
//! transfer that owns it; this module turns the task store into a stream of
//! snapshots.
//!
//! # Examples
//!
//! ```rust,no_run
//! use fetchq::downloader::DownloaderBuilder;
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = DownloaderBuilder::new().build()?;
//! let mut updates = downloader.subscribe_status();
//! while let Some(snapshot) = updates.next().await {
//!     for task in snapshot.values() {
//!         println!("{} {} {:?}", task.id, task.status, task.progress);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod broadcast;

pub use broadcast::{subscribe, StatusStream, STATUS_POLL_INTERVAL};
