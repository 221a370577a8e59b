//! Destination file naming.
//!
//! Files are named with a process-wide sequence number and an extension
//! guessed from the URL, e.g. `downloads/17.zip`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Extension used when none can be inferred from the URL.
pub const DEFAULT_EXTENSION: &str = "mp4";

const MAX_EXTENSION_LEN: usize = 8;

/// Guesses a file extension (without the dot) for `url`.
///
/// Any URL mentioning `.mp4` gets `mp4`. Otherwise the extension of the last
/// path segment is used when it is short and alphanumeric, falling back to
/// [`DEFAULT_EXTENSION`].
///
/// ```rust
/// use fetchq::utils::extension_for;
///
/// assert_eq!(extension_for("https://example.com/archive.tar.gz?x=1"), "gz");
/// assert_eq!(extension_for("https://cdn.example.com/v/clip.MP4/play"), "mp4");
/// assert_eq!(extension_for("https://example.com/stream"), "mp4");
/// ```
pub fn extension_for(url: &str) -> String {
    if url.to_ascii_lowercase().contains(".mp4") {
        return DEFAULT_EXTENSION.to_string();
    }

    reqwest::Url::parse(url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(String::from))
        })
        .map(|segment| {
            form_urlencoded::parse(segment.as_bytes())
                .map(|(key, val)| [key, val].concat())
                .collect::<String>()
        })
        .and_then(|segment| {
            let (stem, ext) = segment.rsplit_once('.')?;
            let usable = !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric());
            usable.then(|| ext.to_ascii_lowercase())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Hands out sequential file names.
#[derive(Debug, Default)]
pub struct FileNamer {
    last: AtomicU64,
}

impl FileNamer {
    /// Starts numbering after `last`.
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    /// Starts numbering after the largest numeric file stem in `directory`.
    ///
    /// A missing or unreadable directory starts the sequence at 1.
    pub fn scan(directory: &Path) -> Self {
        let last = std::fs::read_dir(directory)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .filter_map(|entry| {
                        entry
                            .path()
                            .file_stem()
                            .and_then(|stem| stem.to_str())
                            .and_then(|stem| stem.parse::<u64>().ok())
                    })
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        debug!("File numbering in {:?} continues after {}", directory, last);
        Self::starting_after(last)
    }

    /// The next unused path in `directory` with extension `ext`.
    ///
    /// Numbers whose file already exists are skipped, so a directory change
    /// never overwrites earlier downloads.
    pub async fn allocate(&self, directory: &Path, ext: &str) -> PathBuf {
        loop {
            let n = self.last.fetch_add(1, Ordering::SeqCst) + 1;
            let candidate = directory.join(format!("{}.{}", n, ext));
            if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return candidate;
            }
            debug!("Skipping existing file {:?}", candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_path() {
        assert_eq!(extension_for("https://example.com/file.zip"), "zip");
        assert_eq!(extension_for("https://example.com/a/b/Report.PDF"), "pdf");
        assert_eq!(extension_for("http://example.com/file%2Ebin"), "bin");
    }

    #[test]
    fn test_extension_fallbacks() {
        assert_eq!(extension_for("https://example.com/"), DEFAULT_EXTENSION);
        assert_eq!(extension_for("https://example.com/.hidden"), DEFAULT_EXTENSION);
        assert_eq!(extension_for("https://example.com/file.some-thing"), DEFAULT_EXTENSION);
        assert_eq!(extension_for("https://example.com/file.verylongext"), DEFAULT_EXTENSION);
        assert_eq!(extension_for("not a url"), DEFAULT_EXTENSION);
    }

    #[test]
    fn test_mp4_anywhere_wins() {
        assert_eq!(extension_for("https://example.com/video.mp4?sig=1.zip"), "mp4");
    }

    #[test]
    fn test_scan_picks_up_numbered_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("3.mp4"), b"").unwrap();
        std::fs::write(dir.path().join("12.zip"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let namer = FileNamer::scan(dir.path());
        assert_eq!(namer.last.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let namer = FileNamer::scan(&dir.path().join("absent"));
        assert_eq!(namer.last.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_allocate_is_sequential_and_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2.bin"), b"taken").unwrap();
        let namer = FileNamer::default();

        let first = namer.allocate(dir.path(), "bin").await;
        let second = namer.allocate(dir.path(), "bin").await;

        assert_eq!(first, dir.path().join("1.bin"));
        assert_eq!(second, dir.path().join("3.bin"));
    }
}
