//! # Scanner Module
//!
//! Discovers RAW candidates on disk.
//!
//! ## Default Formats
//! - Canon (.cr2)
//! - Nikon (.nef)
//! - Sony (.arw)
//! - Adobe DNG (.dng)
//! - Olympus (.orf)
//! - Fujifilm (.raf)
//!
//! Two entry points exist: a recursive walker used by indexing and import
//! comparison, and a flat card listing used to build per-day summaries.
//!
//! ## Example
//! ```rust,ignore
//! use raw_index::core::scanner::{FileScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(&["/Volumes/EOS_DIGITAL".into()])?;
//! ```

mod filter;
mod listing;
mod walker;

pub use filter::{ExtensionFilter, RAW_EXTENSIONS};
pub use listing::list_card;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use crate::events::EventSender;
use std::path::PathBuf;

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Candidate paths in traversal order
    pub files: Vec<PathBuf>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for candidate scanners
///
/// Implement this trait to feed the pipeline from somewhere other than a
/// directory walk (e.g., in tests).
pub trait FileScanner: Send + Sync {
    /// Scan directories and return discovered candidates
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError>;

    /// Scan with progress reporting via events
    fn scan_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError>;
}
