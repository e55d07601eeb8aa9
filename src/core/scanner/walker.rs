//! Recursive directory walking using walkdir.

use super::{filter::ExtensionFilter, FileScanner, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent, ScanProgress};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for the directory scanner
///
/// Symlinked directories are not entered. A symlinked file is a candidate
/// when its name matches and the link resolves to a regular file.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Custom extensions to accept (None = RAW defaults, empty = everything)
    pub extensions: Option<Vec<String>>,
}

/// Scanner implementation using the walkdir crate
///
/// Entries are visited in file-name order so repeated runs over the same
/// tree see candidates in the same sequence.
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ExtensionFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = match config.extensions {
            Some(ref extensions) => ExtensionFilter::with_extensions(extensions),
            None => ExtensionFilter::raw(),
        }
        .with_hidden(config.include_hidden);

        Self { config, filter }
    }

    /// The filter this scanner applies to file names
    pub fn filter(&self) -> &ExtensionFilter {
        &self.filter
    }

    fn is_hidden_dir(&self, path: &Path, root: &Path) -> bool {
        if self.config.include_hidden || path == root {
            return false;
        }
        path.file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'))
    }

    /// Scan a single directory tree
    fn scan_directory(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<(Vec<PathBuf>, Vec<ScanError>), ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let root = fs::canonicalize(root).map_err(|source| ScanError::ReadDirectory {
            path: root.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        let mut errors = Vec::new();
        let mut directories_scanned = 0;

        let mut entries = WalkDir::new(&root).sort_by_file_name().into_iter();
        while let Some(entry_result) = entries.next() {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = if e.io_error().map(|io| io.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    warn!(path = %path.display(), "{}", error);
                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                    continue;
                }
            };

            let path = entry.path();

            if entry.file_type().is_dir() {
                if self.is_hidden_dir(path, &root) {
                    entries.skip_current_dir();
                    continue;
                }

                directories_scanned += 1;
                events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                    directories_scanned,
                    candidates_found: files.len(),
                    current_path: path.to_path_buf(),
                })));
                continue;
            }

            if !self.filter.should_include(path) {
                continue;
            }

            // Stat through symlinks so a linked photo is indexed like any other.
            match fs::metadata(path) {
                Ok(metadata) if metadata.is_file() => {
                    debug!(path = %path.display(), "candidate found");
                    events.send(Event::Scan(ScanEvent::CandidateFound {
                        path: path.to_path_buf(),
                    }));
                    files.push(path.to_path_buf());
                }
                Ok(_) => {
                    debug!(path = %path.display(), "matching name is not a regular file, ignored");
                }
                Err(source) => {
                    let error = ScanError::ReadDirectory {
                        path: path.to_path_buf(),
                        source,
                    };

                    warn!(path = %path.display(), "{}", error);
                    events.send(Event::Scan(ScanEvent::Error {
                        path: path.to_path_buf(),
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        Ok((files, errors))
    }
}

impl FileScanner for WalkDirScanner {
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError> {
        self.scan_with_events(paths, &crate::events::null_sender())
    }

    fn scan_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            paths: paths.to_vec(),
        }));

        let mut all_files = Vec::new();
        let mut all_errors = Vec::new();

        for path in paths {
            match self.scan_directory(path, events) {
                Ok((files, errors)) => {
                    all_files.extend(files);
                    all_errors.extend(errors);
                }
                Err(e) => {
                    warn!(path = %path.display(), "{}", e);
                    all_errors.push(e);
                }
            }
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_candidates: all_files.len(),
        }));

        Ok(ScanResult {
            files: all_files,
            errors: all_errors,
        })
    }
}
