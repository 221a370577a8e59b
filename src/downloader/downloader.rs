//! Core downloader implementation: task intake, dispatch and settings.
//!
//! A [`Downloader`] owns a dispatch loop running on the Tokio runtime it was
//! built in. Callers hand it URLs and get task identifiers back straight
//! away; the loop spawns one executor per task and keeps track of them until
//! they finish or the downloader is shut down.
//!
//! # Examples
//!
//! ## Enqueue and Watch
//!
//! ```rust,no_run
//! use fetchq::downloader::DownloaderBuilder;
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), fetchq::Error> {
//! let downloader = DownloaderBuilder::new().build()?;
//! let id = downloader.enqueue("https://example.com/video.mp4").await?;
//!
//! let mut status = downloader.subscribe_status();
//! while let Some(snapshot) = status.next().await {
//!     if snapshot[&id].status.is_terminal() {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Live Settings Updates
//!
//! ```rust,no_run
//! use fetchq::downloader::DownloaderBuilder;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), fetchq::Error> {
//! let downloader = DownloaderBuilder::new().build()?;
//! let settings = downloader.update_settings(&json!({ "max_concurrent": 5 }))?;
//! assert_eq!(settings.max_concurrent, 5);
//! # Ok(())
//! # }
//! ```

use super::config::DownloaderConfig;
use super::executor::TransferExecutor;
use super::gate::ConcurrencyGate;
use super::retry::RetryPolicy;
use crate::download::{Snapshot, Task, TaskStatus, TaskStore};
use crate::error::{Error, Result};
use crate::http::create_http_client;
use crate::progress::{self, StatusStream};
use crate::settings::{LiveSettings, Settings, SettingsPatch, SettingsStore};
use crate::utils::{directory_size, is_http_url, validate_url, FileNamer};

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::fmt::Debug;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Result of [`Downloader::bulk_enqueue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkEnqueued {
    /// Number of tasks created.
    pub count: usize,
    /// Identifiers of the created tasks, in input order.
    pub task_ids: Vec<String>,
}

enum Command {
    Enqueue {
        url: String,
        reply: oneshot::Sender<String>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

struct Shared {
    store: Arc<TaskStore>,
    settings: Arc<LiveSettings>,
    gate: Arc<ConcurrencyGate>,
    settings_store: Arc<dyn SettingsStore>,
    /// Serializes settings updates so persist-then-publish is atomic.
    settings_update: Mutex<()>,
}

/// Represents the download controller.
///
/// A downloader is created via its builder and is cheap to clone; all clones
/// drive the same dispatch loop. When the last clone is dropped the loop
/// stops and running transfers are abandoned, just like
/// [`shutdown`](Downloader::shutdown).
///
/// ```rust,no_run
/// # async fn example() -> Result<(), fetchq::Error> {
/// use fetchq::downloader::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Downloader {
    shared: Arc<Shared>,
    commands: mpsc::UnboundedSender<Command>,
}

impl Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("settings", &self.shared.settings.load())
            .field("settings_store", &self.shared.settings_store)
            .field("tasks", &self.shared.store.len())
            .field("active", &self.shared.gate.active())
            .finish()
    }
}

impl Downloader {
    /// Builds the engine and spawns its dispatch loop on the current runtime.
    pub(crate) fn start(config: DownloaderConfig) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Internal(format!("no Tokio runtime to run on: {}", e)))?;

        let settings = match config.settings {
            Some(settings) => {
                settings.validate()?;
                settings
            }
            None => load_settings(config.settings_store.as_ref()),
        };

        let client = create_http_client(config.http)?;
        let store = Arc::new(TaskStore::new());
        let gate = Arc::new(ConcurrencyGate::new());
        let namer = Arc::new(FileNamer::scan(&settings.download_folder));
        debug!("Starting downloader with {:?}", settings);
        let live = Arc::new(LiveSettings::new(settings));

        let executor = Arc::new(TransferExecutor {
            store: Arc::clone(&store),
            settings: Arc::clone(&live),
            gate: Arc::clone(&gate),
            namer,
            client,
            policy: RetryPolicy::new(config.backoff_unit),
            probe_timeout: config.probe_timeout,
            on_complete: config.on_complete,
        });

        let (commands, receiver) = mpsc::unbounded_channel();
        runtime.spawn(dispatch(receiver, Arc::clone(&store), executor));

        Ok(Self {
            shared: Arc::new(Shared {
                store,
                settings: live,
                gate,
                settings_store: config.settings_store,
                settings_update: Mutex::new(()),
            }),
            commands,
        })
    }

    /// Queues `url` for download and returns the new task's identifier.
    ///
    /// Returns as soon as the task is recorded; the transfer itself runs in
    /// the background.
    pub async fn enqueue(&self, url: &str) -> Result<String> {
        validate_url(url)?;
        let (reply, id) = oneshot::channel();
        self.send(Command::Enqueue {
            url: url.to_string(),
            reply,
        })?;
        id.await.map_err(|_| Error::Shutdown)
    }

    /// Same as [`enqueue`](Downloader::enqueue), for threads outside the
    /// runtime.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn enqueue_blocking(&self, url: &str) -> Result<String> {
        validate_url(url)?;
        let (reply, id) = oneshot::channel();
        self.send(Command::Enqueue {
            url: url.to_string(),
            reply,
        })?;
        id.blocking_recv().map_err(|_| Error::Shutdown)
    }

    /// Queues every well-formed URL in `urls`.
    ///
    /// Entries are trimmed; blank and non-http(s) entries are skipped.
    pub async fn bulk_enqueue<S: AsRef<str>>(&self, urls: &[S]) -> Result<BulkEnqueued> {
        if urls.is_empty() {
            return Err(Error::InvalidRequest("no urls provided".into()));
        }

        let mut task_ids = Vec::with_capacity(urls.len());
        for url in urls {
            let url = url.as_ref().trim();
            if !is_http_url(url) {
                debug!("Skipping malformed URL {:?}", url);
                continue;
            }
            task_ids.push(self.enqueue(url).await?);
        }

        if task_ids.is_empty() {
            return Err(Error::InvalidRequest("no valid urls found".into()));
        }
        info!("Queued {} of {} URLs", task_ids.len(), urls.len());
        Ok(BulkEnqueued {
            count: task_ids.len(),
            task_ids,
        })
    }

    /// Stream of task snapshots, emitted whenever the state changed.
    pub fn subscribe_status(&self) -> StatusStream {
        progress::subscribe(Arc::clone(&self.shared.store))
    }

    /// A copy of one task record.
    pub fn task(&self, id: &str) -> Option<Task> {
        self.shared.store.get(id)
    }

    /// A copy of every task record.
    pub fn tasks(&self) -> Snapshot {
        self.shared.store.snapshot()
    }

    /// The settings currently in effect.
    pub fn settings(&self) -> Arc<Settings> {
        self.shared.settings.load()
    }

    /// Applies a JSON settings update.
    ///
    /// Unknown keys are ignored. If any known key has the wrong type or is
    /// out of range nothing changes and [`Error::InvalidSettings`] is
    /// returned.
    pub fn update_settings(&self, update: &Value) -> Result<Arc<Settings>> {
        let patch = SettingsPatch::from_json(update)?;
        self.apply_settings(&patch)
    }

    /// Applies a typed settings update. See
    /// [`update_settings`](Downloader::update_settings).
    pub fn apply_settings(&self, patch: &SettingsPatch) -> Result<Arc<Settings>> {
        let _guard = self.lock_settings_update();
        let next = self.shared.settings.load().apply(patch)?;
        self.publish_settings(next)
    }

    /// Restores the default settings.
    pub fn reset_settings(&self) -> Result<Arc<Settings>> {
        let _guard = self.lock_settings_update();
        self.publish_settings(Settings::default())
    }

    /// Removes every task whose status is `completed` and returns how many
    /// were removed.
    pub fn cleanup_completed(&self) -> usize {
        let removed = self
            .shared
            .store
            .remove_if(|task| task.status == TaskStatus::Completed);
        if !removed.is_empty() {
            info!("Removed {} completed tasks", removed.len());
        }
        removed.len()
    }

    /// Total size in bytes of the files below `path`.
    pub async fn inspect_directory_size(&self, path: impl AsRef<Path>) -> u64 {
        let path = path.as_ref().to_path_buf();
        match tokio::task::spawn_blocking(move || directory_size(&path)).await {
            Ok(size) => size,
            Err(e) => {
                warn!("Directory size scan failed: {}", e);
                0
            }
        }
    }

    /// Number of transfers currently holding a gate slot.
    pub fn active_transfers(&self) -> usize {
        self.shared.gate.active()
    }

    /// Stops accepting work and abandons running transfers.
    ///
    /// Partial files are left on disk. Later calls to
    /// [`enqueue`](Downloader::enqueue) fail with [`Error::Shutdown`].
    pub async fn shutdown(&self) {
        let (done, finished) = oneshot::channel();
        if self.commands.send(Command::Shutdown { done }).is_ok() {
            let _ = finished.await;
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::Shutdown)
    }

    fn lock_settings_update(&self) -> std::sync::MutexGuard<'_, ()> {
        self.shared
            .settings_update
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Persists `next`, then makes it live. Callers hold the update lock.
    fn publish_settings(&self, next: Settings) -> Result<Arc<Settings>> {
        self.shared
            .settings_store
            .save(&next)
            .map_err(|source| Error::Persistence { source })?;

        let limit = next.max_concurrent;
        let previous = self.shared.settings.publish(next);
        if previous.max_concurrent != limit {
            self.shared.gate.resize(limit);
        }

        let current = self.shared.settings.load();
        info!("Settings updated: {:?}", current);
        Ok(current)
    }
}

/// Reads the persisted settings, falling back to the defaults.
fn load_settings(store: &dyn SettingsStore) -> Settings {
    match store.load() {
        Ok(Some(settings)) => match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                warn!("Ignoring stored settings: {}", e);
                Settings::default()
            }
        },
        Ok(None) => Settings::default(),
        Err(e) => {
            warn!("Could not load settings, using defaults: {}", e);
            Settings::default()
        }
    }
}

/// Owns every executor. Runs until shut down or every handle is dropped.
async fn dispatch(
    mut commands: mpsc::UnboundedReceiver<Command>,
    store: Arc<TaskStore>,
    executor: Arc<TransferExecutor>,
) {
    let mut running = JoinSet::new();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Enqueue { url, reply }) => {
                    let id = store.create(&url);
                    debug!(task = %id, "Queued {}", url);
                    running.spawn(Arc::clone(&executor).run(id.clone(), url));
                    // The caller may have stopped waiting; the task runs anyway.
                    let _ = reply.send(id);
                }
                Some(Command::Shutdown { done }) => {
                    abandon(&mut running).await;
                    let _ = done.send(());
                    break;
                }
                None => {
                    abandon(&mut running).await;
                    break;
                }
            },
            Some(joined) = running.join_next(), if !running.is_empty() => {
                if let Err(e) = joined {
                    warn!("Transfer task ended abnormally: {}", e);
                }
            }
        }
    }
}

async fn abandon(running: &mut JoinSet<()>) {
    if !running.is_empty() {
        info!("Abandoning {} running transfers", running.len());
    }
    running.shutdown().await;
}
