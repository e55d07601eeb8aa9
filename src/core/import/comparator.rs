//! Read-only comparison of a source directory against the index.

use super::{Classification, ComparisonMethod, ImportReport};
use crate::core::fingerprint::fingerprint_files;
use crate::core::index::IndexBackend;
use crate::core::scanner::{ExtensionFilter, FileScanner, ScanConfig, WalkDirScanner};
use crate::error::{RawIndexError, ScanError};
use crate::events::{
    null_sender, Event, EventSender, ImportEvent, ImportProgress, PipelineEvent, PipelinePhase,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Classify arbitrary paths as already indexed or not.
///
/// Only RAW candidates are classified; other paths are left out of the
/// report. Unreadable files are recorded as errors and left out as well.
pub fn classify(
    paths: &[PathBuf],
    index: &dyn IndexBackend,
    method: ComparisonMethod,
) -> Result<ImportReport, RawIndexError> {
    let filter = ExtensionFilter::raw().with_hidden(true);
    classify_with_events(paths, &filter, index, method, &null_sender())
}

fn classify_with_events(
    paths: &[PathBuf],
    filter: &ExtensionFilter,
    index: &dyn IndexBackend,
    method: ComparisonMethod,
    events: &EventSender,
) -> Result<ImportReport, RawIndexError> {
    let start_time = Instant::now();
    let candidates: Vec<PathBuf> = paths
        .iter()
        .filter(|p| filter.should_include(p))
        .cloned()
        .collect();

    events.send(Event::Import(ImportEvent::Started {
        total_candidates: candidates.len(),
    }));

    let mut tally = Tally::new(candidates.len(), events);
    let mut errors = Vec::new();

    match method {
        ComparisonMethod::Fingerprint => {
            let fingerprints = fingerprint_files(&candidates);
            for (path, result) in candidates.into_iter().zip(fingerprints) {
                match result {
                    Ok(fingerprint) => {
                        let already_indexed = index.contains(&fingerprint)?;
                        tally.push(path, already_indexed);
                    }
                    Err(e) => {
                        warn!("{}", e);
                        events.send(Event::Import(ImportEvent::Error {
                            path,
                            message: e.to_string(),
                        }));
                        errors.push(e.to_string());
                    }
                }
            }
        }
        ComparisonMethod::Filename => {
            for path in candidates {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let already_indexed = index.contains_filename(&name)?;
                tally.push(path, already_indexed);
            }
        }
    }

    let report = ImportReport {
        method,
        classifications: tally.entries,
        errors,
        duration_ms: start_time.elapsed().as_millis() as u64,
    };

    events.send(Event::Import(ImportEvent::Completed {
        new_files: report.new_count(),
        known_files: report.known_count(),
    }));

    Ok(report)
}

/// Collects classifications and reports progress as they arrive
struct Tally<'e> {
    entries: Vec<Classification>,
    total: usize,
    new_files: usize,
    events: &'e EventSender,
}

impl<'e> Tally<'e> {
    fn new(total: usize, events: &'e EventSender) -> Self {
        Self {
            entries: Vec::with_capacity(total),
            total,
            new_files: 0,
            events,
        }
    }

    fn push(&mut self, path: PathBuf, already_indexed: bool) {
        if !already_indexed {
            self.new_files += 1;
            self.events
                .send(Event::Import(ImportEvent::NewFile { path: path.clone() }));
        }
        self.entries.push(Classification {
            path,
            already_indexed,
        });
        self.events.send(Event::Import(ImportEvent::Progress(ImportProgress {
            completed: self.entries.len(),
            total: self.total,
            new_files: self.new_files,
        })));
    }
}

/// Walks a source directory (a camera card, usually) and reports which RAW
/// files the index has not seen.
pub struct ImportComparator<'a> {
    index: &'a dyn IndexBackend,
    method: ComparisonMethod,
    scan_config: ScanConfig,
}

impl<'a> ImportComparator<'a> {
    /// Compare against `index` using `method`
    pub fn new(index: &'a dyn IndexBackend, method: ComparisonMethod) -> Self {
        Self {
            index,
            method,
            scan_config: ScanConfig::default(),
        }
    }

    /// Set scanner configuration. Its extension set also decides which
    /// files are classified.
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.scan_config = config;
        self
    }

    /// Compare without events
    pub fn compare(&self, source: &Path) -> Result<ImportReport, RawIndexError> {
        self.compare_with_events(source, &null_sender())
    }

    /// Compare with event reporting.
    ///
    /// A fatal error is also reported as `PipelineEvent::Error`.
    pub fn compare_with_events(
        &self,
        source: &Path,
        events: &EventSender,
    ) -> Result<ImportReport, RawIndexError> {
        let result = self.execute(source, events);
        if let Err(e) = &result {
            warn!("comparison stopped: {}", e);
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
        }
        result
    }

    fn execute(&self, source: &Path, events: &EventSender) -> Result<ImportReport, RawIndexError> {
        if !source.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: source.to_path_buf(),
            }
            .into());
        }

        let start_time = Instant::now();
        events.send(Event::Pipeline(PipelineEvent::Started));
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));

        let scanner = WalkDirScanner::new(self.scan_config.clone());
        let scan_result = scanner.scan_with_events(&[source.to_path_buf()], events)?;

        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Comparing,
        }));

        let mut report = classify_with_events(
            &scan_result.files,
            scanner.filter(),
            self.index,
            self.method,
            events,
        )?;
        let mut errors: Vec<String> = scan_result.errors.iter().map(|e| e.to_string()).collect();
        errors.append(&mut report.errors);
        report.errors = errors;
        report.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            source = %source.display(),
            method = %self.method,
            new_files = report.new_count(),
            known_files = report.known_count(),
            "comparison finished"
        );

        Ok(report)
    }
}
