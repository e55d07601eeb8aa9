//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted while indexing or comparing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Directory walking events
    Scan(ScanEvent),
    /// Index write events
    Index(IndexEvent),
    /// Import comparison events
    Import(ImportEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { paths: Vec<PathBuf> },
    /// Progress update during scanning
    Progress(ScanProgress),
    /// A RAW candidate was found
    CandidateFound { path: PathBuf },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_candidates: usize },
}

/// Progress information during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of directories scanned so far
    pub directories_scanned: usize,
    /// Number of candidates found so far
    pub candidates_found: usize,
    /// Current directory being scanned
    pub current_path: PathBuf,
}

/// Events while fingerprinting candidates and writing them to the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndexEvent {
    /// Indexing has started
    Started { total_candidates: usize },
    /// Progress update during fingerprinting
    Progress(IndexProgress),
    /// A pending batch was written
    BatchFlushed {
        inserted: usize,
        skipped: usize,
        /// False when the bulk insert failed and records were retried one by one
        bulk: bool,
    },
    /// A candidate was not written
    Skipped { path: PathBuf, reason: String },
    /// A file could not be read but indexing continues
    Error { path: PathBuf, message: String },
    /// Indexing completed
    Completed { inserted: usize, skipped: usize },
}

/// Progress information during indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexProgress {
    /// Number of candidates fingerprinted so far
    pub completed: usize,
    /// Total number of candidates
    pub total: usize,
    /// Last candidate fingerprinted
    pub current_path: PathBuf,
}

/// Events while comparing a card against the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImportEvent {
    /// Comparison has started
    Started { total_candidates: usize },
    /// Progress update during comparison
    Progress(ImportProgress),
    /// A file was found that the index does not know
    NewFile { path: PathBuf },
    /// A file could not be read but comparison continues
    Error { path: PathBuf, message: String },
    /// Comparison completed
    Completed { new_files: usize, known_files: usize },
}

/// Progress information during comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportProgress {
    /// Number of candidates classified so far
    pub completed: usize,
    /// Total number of candidates
    pub total: usize,
    /// Number of new files found so far
    pub new_files: usize,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Fingerprinting,
    Comparing,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// RAW candidates found
    pub total_candidates: usize,
    /// Records written to the index
    pub inserted: usize,
    /// Candidates not written (already indexed or duplicated in a batch)
    pub skipped: usize,
    /// Files that could not be read
    pub errors: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Fingerprinting => write!(f, "Fingerprinting"),
            PipelinePhase::Comparing => write!(f, "Comparing"),
        }
    }
}
