//! Indexing pipeline implementation.

use crate::core::fingerprint::fingerprint_file;
use crate::core::index::{
    BatchOutcome, InMemoryIndex, IndexBackend, PendingRecord, SkipReason, SkippedRecord,
};
use crate::core::metadata;
use crate::core::scanner::{FileScanner, ScanConfig, WalkDirScanner};
use crate::error::{RawIndexError, ScanError};
use crate::events::{
    null_sender, Event, EventSender, IndexEvent, IndexProgress, PipelineEvent, PipelinePhase,
    PipelineSummary,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default number of records written per batch
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// What to do when two candidates in one pending batch share a fingerprint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InBatchPolicy {
    /// Write the first occurrence, skip later copies
    #[default]
    KeepFirst,
    /// Write none of the colliding records
    DropAll,
}

/// A candidate that was not written, with the reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Result of an indexing run
#[derive(Debug, Default, Serialize)]
pub struct IndexReport {
    /// RAW candidates found while walking
    pub total_candidates: usize,
    /// Records written to the index
    pub inserted: usize,
    /// Candidates not written
    pub skipped: Vec<SkippedFile>,
    /// Records computed in dry-run mode (nothing written)
    pub previewed: Vec<PendingRecord>,
    /// Per-file errors (non-fatal)
    pub errors: Vec<String>,
    /// Number of batch flushes attempted
    pub batches_flushed: usize,
    /// Flushes that needed the per-record fallback
    pub fallback_flushes: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl IndexReport {
    /// Candidates skipped because the index already had them
    pub fn already_indexed(&self) -> usize {
        self.count_skipped(SkipReason::AlreadyIndexed)
    }

    /// Candidates skipped because of a collision inside one batch
    pub fn duplicates_in_batch(&self) -> usize {
        self.count_skipped(SkipReason::DuplicateInBatch)
    }

    fn count_skipped(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directories to index
    pub paths: Vec<PathBuf>,
    /// Records per batch flush
    pub batch_size: usize,
    /// Fingerprint and report only; never touch the index
    pub dry_run: bool,
    /// Handling of fingerprint collisions inside one batch
    pub in_batch_policy: InBatchPolicy,
    /// Scanner configuration
    pub scan_config: ScanConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
            in_batch_policy: InBatchPolicy::default(),
            scan_config: ScanConfig::default(),
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    index: Option<Arc<dyn IndexBackend>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            index: None,
        }
    }

    /// Directories to index
    pub fn paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.paths = paths;
        self
    }

    /// Records per batch flush. Zero is treated as one.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size.max(1);
        self
    }

    /// Fingerprint and report without writing
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Set the in-batch collision policy
    pub fn in_batch_policy(mut self, policy: InBatchPolicy) -> Self {
        self.config.in_batch_policy = policy;
        self
    }

    /// Set the index backend
    pub fn index(mut self, index: Arc<dyn IndexBackend>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        Pipeline {
            config: self.config,
            index: self.index.unwrap_or_else(|| Arc::new(InMemoryIndex::new())),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks directories and adds unseen photos to the index
pub struct Pipeline {
    config: PipelineConfig,
    index: Arc<dyn IndexBackend>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// The index this pipeline writes to
    pub fn index(&self) -> &Arc<dyn IndexBackend> {
        &self.index
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<IndexReport, RawIndexError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting.
    ///
    /// A root that is not a directory fails the run before anything is read.
    /// Unreadable files are recorded in the report and skipped. An index
    /// failure stops the run; batches flushed before it stay committed.
    /// A fatal error is also reported as `PipelineEvent::Error`.
    pub fn run_with_events(&self, events: &EventSender) -> Result<IndexReport, RawIndexError> {
        let result = self.execute(events);
        if let Err(e) = &result {
            warn!("indexing stopped: {}", e);
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
        }
        result
    }

    fn execute(&self, events: &EventSender) -> Result<IndexReport, RawIndexError> {
        if let Some(missing) = self.config.paths.iter().find(|p| !p.is_dir()) {
            return Err(ScanError::DirectoryNotFound {
                path: missing.clone(),
            }
            .into());
        }

        let start_time = Instant::now();
        let mut report = IndexReport::default();

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Scanning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));

        let scanner = WalkDirScanner::new(self.config.scan_config.clone());
        let scan_result = scanner.scan_with_events(&self.config.paths, events)?;

        report
            .errors
            .extend(scan_result.errors.iter().map(|e| e.to_string()));

        let files = scan_result.files;
        report.total_candidates = files.len();

        // Phase 2: Fingerprinting and writing
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Fingerprinting,
        }));
        events.send(Event::Index(IndexEvent::Started {
            total_candidates: files.len(),
        }));

        let completed = AtomicUsize::new(0);
        let mut pending: Vec<PendingRecord> = Vec::with_capacity(self.config.batch_size);

        for chunk in files.chunks(self.config.batch_size) {
            let results = self.prepare_chunk(chunk, files.len(), &completed, events);

            for result in results {
                match result {
                    Ok(record) if self.config.dry_run => {
                        info!(
                            folder = %record.folder,
                            filename = %record.filename,
                            fingerprint = %record.fingerprint,
                            creation_time = %metadata::format_timestamp(&record.creation_time),
                            filepath = %record.filepath.display(),
                            "dry run"
                        );
                        report.previewed.push(record);
                    }
                    Ok(record) => {
                        pending.push(record);
                        if pending.len() >= self.config.batch_size {
                            self.flush(&mut pending, &mut report, events)?;
                        }
                    }
                    Err((path, message)) => {
                        warn!(path = %path.display(), "{}", message);
                        events.send(Event::Index(IndexEvent::Error {
                            path,
                            message: message.clone(),
                        }));
                        report.errors.push(message);
                    }
                }
            }
        }

        if !pending.is_empty() {
            self.flush(&mut pending, &mut report, events)?;
        }

        report.duration_ms = start_time.elapsed().as_millis() as u64;

        events.send(Event::Index(IndexEvent::Completed {
            inserted: report.inserted,
            skipped: report.skipped.len(),
        }));
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_candidates: report.total_candidates,
                inserted: report.inserted,
                skipped: report.skipped.len(),
                errors: report.errors.len(),
                duration_ms: report.duration_ms,
            },
        }));

        info!(
            candidates = report.total_candidates,
            inserted = report.inserted,
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            "indexing finished"
        );

        Ok(report)
    }

    /// Fingerprint and date a chunk of candidates in parallel, keeping order
    fn prepare_chunk(
        &self,
        chunk: &[PathBuf],
        total: usize,
        completed: &AtomicUsize,
        events: &EventSender,
    ) -> Vec<Result<PendingRecord, (PathBuf, String)>> {
        chunk
            .par_iter()
            .map(|path| -> Result<PendingRecord, (PathBuf, String)> {
                let fingerprint =
                    fingerprint_file(path).map_err(|e| (path.clone(), e.to_string()))?;
                let creation_time =
                    metadata::creation_time(path).map_err(|e| (path.clone(), e.to_string()))?;

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                events.send(Event::Index(IndexEvent::Progress(IndexProgress {
                    completed: done,
                    total,
                    current_path: path.clone(),
                })));
                debug!(path = %path.display(), %fingerprint, "fingerprinted");

                Ok(PendingRecord::new(path.clone(), fingerprint, creation_time))
            })
            .collect()
    }

    /// Write the pending batch and record the outcome
    fn flush(
        &self,
        pending: &mut Vec<PendingRecord>,
        report: &mut IndexReport,
        events: &EventSender,
    ) -> Result<(), RawIndexError> {
        let batch = std::mem::take(pending);
        let (batch, collisions) = apply_in_batch_policy(batch, self.config.in_batch_policy);

        let BatchOutcome {
            inserted,
            skipped,
            bulk,
        } = self.index.insert_batch(&batch)?;

        report.batches_flushed += 1;
        if !bulk {
            report.fallback_flushes += 1;
        }
        report.inserted += inserted.len();

        let skipped_count = collisions.len() + skipped.len();
        for SkippedRecord { record, reason } in collisions.into_iter().chain(skipped) {
            debug!(path = %record.filepath.display(), %reason, "skipped");
            events.send(Event::Index(IndexEvent::Skipped {
                path: record.filepath.clone(),
                reason: reason.to_string(),
            }));
            report.skipped.push(SkippedFile {
                path: record.filepath,
                reason,
            });
        }

        events.send(Event::Index(IndexEvent::BatchFlushed {
            inserted: inserted.len(),
            skipped: skipped_count,
            bulk,
        }));
        info!(
            inserted = inserted.len(),
            skipped = skipped_count,
            bulk,
            "batch flushed"
        );

        Ok(())
    }
}

/// Remove fingerprint collisions from a batch before it is written.
///
/// Returns the records to write and the records removed.
pub fn apply_in_batch_policy(
    batch: Vec<PendingRecord>,
    policy: InBatchPolicy,
) -> (Vec<PendingRecord>, Vec<SkippedRecord>) {
    let mut keep = Vec::with_capacity(batch.len());
    let mut removed = Vec::new();

    match policy {
        InBatchPolicy::KeepFirst => {
            let mut seen = HashSet::new();
            for record in batch {
                if seen.insert(record.fingerprint.clone()) {
                    keep.push(record);
                } else {
                    removed.push(SkippedRecord {
                        record,
                        reason: SkipReason::DuplicateInBatch,
                    });
                }
            }
        }
        InBatchPolicy::DropAll => {
            let mut counts: HashMap<_, usize> = HashMap::new();
            for record in &batch {
                *counts.entry(record.fingerprint.clone()).or_default() += 1;
            }
            for record in batch {
                if counts[&record.fingerprint] > 1 {
                    removed.push(SkippedRecord {
                        record,
                        reason: SkipReason::DuplicateInBatch,
                    });
                } else {
                    keep.push(record);
                }
            }
        }
    }

    (keep, removed)
}
