use fetchq::download::Task;
use fetchq::settings::{MemorySettingsStore, Settings, SettingsStore};
use fetchq::{Downloader, DownloaderBuilder};

use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

// Common test constants
pub const TEST_TIMEOUT: Duration = Duration::from_secs(20);
pub const BACKOFF_UNIT: Duration = Duration::from_millis(10);

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Random bytes, so a misplaced byte range never goes unnoticed
pub fn random_payload(len: usize) -> Vec<u8> {
    let mut payload = vec![0u8; len];
    rand::rng().fill(&mut payload[..]);
    payload
}

/// Settings pointing at `dir`, with small chunks and few retries
pub fn test_settings(dir: &Path) -> Settings {
    Settings {
        download_folder: dir.to_path_buf(),
        max_concurrent: 2,
        max_retries: 3,
        download_timeout: 30,
        chunk_size: 16,
        auto_dark_mode: false,
    }
}

/// Builder with in-memory settings persistence and fast backoff
pub fn test_builder(settings: Settings) -> DownloaderBuilder {
    DownloaderBuilder::new()
        .settings(settings)
        .settings_store(MemorySettingsStore::new())
        .backoff_unit(BACKOFF_UNIT)
        .probe_timeout(Duration::from_secs(2))
}

pub fn test_downloader(settings: Settings) -> Downloader {
    test_builder(settings)
        .build()
        .expect("Failed to build downloader")
}

/// Polls until `condition` holds, panicking after [`TEST_TIMEOUT`]
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(TEST_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Condition not met in time");
}

/// Waits for task `id` to complete or fail and returns its final record
pub async fn wait_for_terminal(downloader: &Downloader, id: &str) -> Task {
    wait_until(|| {
        downloader
            .task(id)
            .is_some_and(|task| task.status.is_terminal())
    })
    .await;
    downloader.task(id).expect("Task disappeared")
}

/// Regular files directly inside `dir`
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect()
        })
        .unwrap_or_default()
}

/// A settings store whose writes always fail
#[derive(Debug, Default)]
pub struct FailingStore;

impl SettingsStore for FailingStore {
    fn load(&self) -> fetchq::Result<Option<Settings>> {
        Ok(None)
    }

    fn save(&self, _settings: &Settings) -> io::Result<()> {
        Err(io::Error::other("disk full"))
    }
}
