//! # Transfer Module
//!
//! Copies chosen files off a card into a library folder.
//!
//! Copies are plain `fs::copy` calls. A file that was in the destination
//! before the transfer is never overwritten; it is reported as skipped. Two
//! sources with the same name in one transfer (say `100CANON/IMG_0001.CR2`
//! and `101CANON/IMG_0001.CR2`) are both kept: the later one gets a numbered
//! name such as `IMG_0001_1.CR2`. Nothing is rolled back if a later copy
//! fails.

use crate::error::TransferError;
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Result of a transfer
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferResult {
    /// Destination paths written
    pub copied: Vec<PathBuf>,
    /// Destination paths that existed before the transfer
    pub skipped_existing: Vec<PathBuf>,
    /// Bytes copied
    pub total_size_bytes: u64,
    /// Per-file failures
    pub errors: Vec<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Copy `files` into `destination`, keeping their file names.
///
/// The destination folder is created if needed; failing to create it stops
/// the transfer before any copy. `on_progress` receives
/// `(done, total, current file)` at most every 100ms and once at the end.
pub fn copy_into<F>(
    files: &[PathBuf],
    destination: &Path,
    mut on_progress: F,
) -> Result<TransferResult, TransferError>
where
    F: FnMut(usize, usize, &Path),
{
    const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

    let start = Instant::now();
    let mut last_progress = Instant::now();
    let mut result = TransferResult::default();
    let mut written: HashSet<PathBuf> = HashSet::new();

    fs::create_dir_all(destination).map_err(|source| TransferError::DestinationUnavailable {
        path: destination.to_path_buf(),
        source,
    })?;

    for (i, source) in files.iter().enumerate() {
        let now = Instant::now();
        if now.duration_since(last_progress) >= PROGRESS_INTERVAL {
            on_progress(i + 1, files.len(), source);
            last_progress = now;
        }

        let Some(name) = source.file_name() else {
            result
                .errors
                .push(format!("{}: not a file path", source.display()));
            continue;
        };

        if !source.is_file() {
            result
                .errors
                .push(format!("{}: source file not found", source.display()));
            continue;
        }

        let mut target = destination.join(name);
        if written.contains(&target) {
            target = numbered_target(destination, name);
            info!(
                source = %source.display(),
                target = %target.display(),
                "name already used in this transfer, copying under a new name"
            );
        } else if target.exists() {
            warn!(path = %target.display(), "already exists in destination, not copied");
            result.skipped_existing.push(target);
            continue;
        }

        match fs::copy(source, &target) {
            Ok(bytes) => {
                result.total_size_bytes += bytes;
                written.insert(target.clone());
                result.copied.push(target);
            }
            Err(e) => result.errors.push(format!("{}: {}", source.display(), e)),
        }
    }

    on_progress(files.len(), files.len(), Path::new(""));

    result.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        destination = %destination.display(),
        copied = result.copied.len(),
        skipped = result.skipped_existing.len(),
        errors = result.errors.len(),
        "transfer finished"
    );

    Ok(result)
}

/// First free `{stem}_{n}{.ext}` in `destination`, counting from 1.
fn numbered_target(destination: &Path, name: &OsStr) -> PathBuf {
    let name = Path::new(name);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1u32..)
        .map(|n| destination.join(format!("{stem}_{n}{ext}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| destination.join(name))
}
