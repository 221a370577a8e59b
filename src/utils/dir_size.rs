//! Disk usage of a directory tree.

use std::path::Path;
use walkdir::WalkDir;

/// Sums the sizes of all regular files below `path`, recursively.
///
/// Entries that cannot be read are skipped; a missing path yields 0.
pub fn directory_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}
