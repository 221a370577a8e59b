//! Transfer execution for a single task.
//!
//! [`TransferExecutor::run`] drives one task from `queued` to a terminal
//! state: it waits for a gate slot, then repeats [`attempt`] under the
//! [`RetryPolicy`] until the body is on disk or the retry budget is spent.
//!
//! An attempt probes the size with `HEAD`, picks (or reuses) the destination
//! file, and streams the `GET` body to disk. When a previous attempt left
//! bytes behind, the request asks for the remainder with a `Range` header; a
//! `206` answer is appended, a `200` answer starts the file over.
//!
//! [`attempt`]: TransferExecutor::attempt

use super::config::DownloadCallback;
use super::gate::ConcurrencyGate;
use super::retry::{RetryDecision, RetryPolicy};
use crate::download::{Task, TaskStatus, TaskStore};
use crate::error::{Error, Result};
use crate::settings::{LiveSettings, Settings};
use crate::utils::{content_length, extension_for, FileNamer};

use futures::StreamExt;
use reqwest::{header::RANGE, Response, StatusCode};
use reqwest_middleware::ClientWithMiddleware;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::{fs, fs::File, fs::OpenOptions, io::AsyncWriteExt};
use tracing::{debug, info, warn};

/// Everything a task's execution context needs, shared by all tasks.
pub(crate) struct TransferExecutor {
    pub(crate) store: Arc<TaskStore>,
    pub(crate) settings: Arc<LiveSettings>,
    pub(crate) gate: Arc<ConcurrencyGate>,
    pub(crate) namer: Arc<FileNamer>,
    pub(crate) client: ClientWithMiddleware,
    pub(crate) policy: RetryPolicy,
    pub(crate) probe_timeout: Duration,
    pub(crate) on_complete: Option<Arc<DownloadCallback>>,
}

/// Where an attempt writes and how much is already there.
struct Destination {
    path: PathBuf,
    offset: u64,
}

impl TransferExecutor {
    /// Runs task `id` to completion or exhaustion.
    pub(crate) async fn run(self: Arc<Self>, id: String, url: String) {
        let limit = self.settings.load().max_concurrent;
        let permit = self.gate.acquire(limit).await;
        debug!(task = %id, "Acquired transfer slot");

        let mut attempt: u32 = 0;
        loop {
            // One snapshot per attempt; updates apply from the next attempt on.
            let settings = self.settings.load();
            if attempt == 0 {
                self.update(&id, |task| task.status = TaskStatus::Starting);
            }

            let cause = match self.attempt(&id, &url, attempt, &settings).await {
                Ok(()) => {
                    self.update(&id, |task| {
                        task.status = TaskStatus::Completed;
                        task.progress = Some(100.0);
                        task.retry_count = attempt;
                    });
                    info!(task = %id, "Downloaded {}", url);
                    break;
                }
                Err(e) => e,
            };

            attempt += 1;
            let max_retries = settings.max_retries;
            match self.policy.decide(attempt, max_retries) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        task = %id,
                        "Attempt {} of {} failed, retrying in {:?}: {}",
                        attempt, url, delay, cause
                    );
                    self.update(&id, |task| {
                        task.status = TaskStatus::Retrying {
                            attempt,
                            max_retries,
                        };
                        task.error = Some(format!("Attempt {} failed: {}", attempt, cause));
                        task.retry_count = attempt;
                    });
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::Exhausted => {
                    self.exhaust(&id, attempt, max_retries, &cause).await;
                    warn!(task = %id, "Giving up on {}: {}", url, cause);
                    break;
                }
            }
        }

        self.gate.release(permit);

        if let Some(callback) = &self.on_complete {
            if let Some(task) = self.store.get(&id) {
                callback(&task);
            }
        }
    }

    /// One pass of the transfer protocol.
    async fn attempt(&self, id: &str, url: &str, attempt: u32, settings: &Settings) -> Result<()> {
        let total = self.probe(url).await;
        let assigned = self.store.mutate(id, |task| {
            task.total_bytes = total.unwrap_or(0);
            let downloaded = task.downloaded_bytes;
            task.set_downloaded(downloaded);
            task.status = TaskStatus::Downloading;
            task.filename.clone()
        })?;

        let Destination { path, offset } = self
            .destination(id, url, attempt, assigned, total, settings)
            .await?;
        let resuming = offset > 0;

        if resuming {
            self.store.mutate(id, |task| task.set_downloaded(offset))?;
            if total == Some(offset) {
                debug!(task = %id, "{:?} is already complete", path);
                return Ok(());
            }
        }

        debug!(task = %id, "Fetching {} into {:?} from byte {}", url, path, offset);
        let mut request = self.client.get(url);
        if resuming {
            request = request.header(RANGE, format!("bytes={}-", offset));
        }
        let timeout = settings.download_timeout();
        let response = tokio::time::timeout(timeout, request.send())
            .await
            .map_err(|_| Error::Timeout("response headers"))??;

        let append = match response.status() {
            StatusCode::PARTIAL_CONTENT if resuming => true,
            StatusCode::OK => false,
            other => return Err(Error::UnexpectedStatus(other)),
        };
        let start = if append {
            offset
        } else {
            if resuming {
                debug!(task = %id, "Server ignored the range request, starting over");
            }
            self.store.mutate(id, |task| task.set_downloaded(0))?;
            0
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)
            .await?;

        // Flush even when streaming failed so the next attempt sees every
        // byte counted in `downloaded_bytes` on disk.
        let streamed = self
            .stream_body(id, response, &mut file, start, settings)
            .await;
        let flushed = file.flush().await;
        let downloaded = streamed?;
        flushed?;

        match total {
            Some(total) if downloaded < total => Err(Error::IncompleteBody {
                expected: total,
                received: downloaded,
            }),
            Some(total) if downloaded > total => {
                debug!(task = %id, "Body outgrew the probed size of {} bytes", total);
                self.store.mutate(id, |task| task.total_bytes = downloaded)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Best-effort size probe. Any failure means "unknown".
    async fn probe(&self, url: &str) -> Option<u64> {
        match self.client.head(url).timeout(self.probe_timeout).send().await {
            Ok(response) if response.status().is_client_error() || response.status().is_server_error() => {
                debug!("Size probe for {} answered {}", url, response.status());
                None
            }
            Ok(response) => content_length(response.headers()),
            Err(e) => {
                debug!("Size probe for {} failed: {}", url, e);
                None
            }
        }
    }

    /// Picks the file this attempt writes to and the offset to resume from.
    async fn destination(
        &self,
        id: &str,
        url: &str,
        attempt: u32,
        assigned: Option<PathBuf>,
        total: Option<u64>,
        settings: &Settings,
    ) -> Result<Destination> {
        let path = match assigned {
            Some(path) => path,
            None => {
                let path = self
                    .namer
                    .allocate(&settings.download_folder, &extension_for(url))
                    .await;
                self.store
                    .mutate(id, |task| task.filename = Some(path.clone()))?;
                return Ok(Destination { path, offset: 0 });
            }
        };

        let on_disk = match fs::metadata(&path).await {
            Ok(metadata) if attempt > 0 && metadata.is_file() => metadata.len(),
            _ => 0,
        };
        // More bytes than the server says exist cannot be resumed.
        let offset = match total {
            Some(total) if on_disk > total => 0,
            _ => on_disk,
        };
        Ok(Destination { path, offset })
    }

    /// Writes the body to `file` and returns the byte counter reached.
    async fn stream_body(
        &self,
        id: &str,
        response: Response,
        file: &mut File,
        start: u64,
        settings: &Settings,
    ) -> Result<u64> {
        let chunk_size = settings.chunk_size_bytes();
        let timeout = settings.download_timeout();
        let mut downloaded = start;
        let mut body = response.bytes_stream();

        while let Some(item) = tokio::time::timeout(timeout, body.next())
            .await
            .map_err(|_| Error::Timeout("response body"))?
        {
            let bytes = item?;
            for piece in bytes.chunks(chunk_size) {
                file.write_all(piece).await?;
                downloaded += piece.len() as u64;
                self.store
                    .mutate(id, |task| task.set_downloaded(downloaded))?;
            }
        }

        Ok(downloaded)
    }

    /// Terminal failure: record the error and remove the partial file.
    async fn exhaust(&self, id: &str, attempt: u32, max_retries: u32, cause: &Error) {
        let mut message = format!("Failed after {} retries: {}", max_retries, cause);
        let mut cleaned = true;

        if let Some(path) = self.store.get(id).and_then(|task| task.filename) {
            match fs::remove_file(&path).await {
                Ok(()) => debug!(task = %id, "Removed partial file {:?}", path),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    message.push_str(&format!(" (cleanup failed: {})", e));
                    cleaned = false;
                }
            }
        }

        self.update(id, |task| {
            task.status = TaskStatus::Error;
            task.error = Some(message);
            task.retry_count = attempt;
            if cleaned {
                task.filename = None;
            }
        });
    }

    /// Applies a record update, logging instead of failing if the task is gone.
    fn update(&self, id: &str, f: impl FnOnce(&mut Task)) {
        if let Err(e) = self.store.mutate(id, f) {
            warn!("Dropping task update: {}", e);
        }
    }
}
