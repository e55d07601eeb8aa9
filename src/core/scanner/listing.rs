//! Flat listing of a card directory with timestamps.

use super::filter::ExtensionFilter;
use crate::core::metadata;
use crate::error::ScanError;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// List the files directly inside `directory` that pass `filter`, with their
/// timestamps.
///
/// Subdirectories are not entered. Entries come back sorted by file name so
/// that equal timestamps group in a stable order. A file whose metadata cannot
/// be read is logged and left out.
pub fn list_card(
    directory: &Path,
    filter: &ExtensionFilter,
) -> Result<Vec<(PathBuf, NaiveDateTime)>, ScanError> {
    if !directory.is_dir() {
        return Err(ScanError::DirectoryNotFound {
            path: directory.to_path_buf(),
        });
    }

    let read_dir = fs::read_dir(directory).map_err(|source| ScanError::ReadDirectory {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && filter.should_include(path))
        .collect();
    paths.sort();

    let mut contents = Vec::with_capacity(paths.len());
    for path in paths {
        match metadata::creation_time(&path) {
            Ok(stamp) => contents.push((path, stamp)),
            Err(e) => warn!("{}", e),
        }
    }

    Ok(contents)
}
