//! # Import Module
//!
//! Answers "which of these files does the library not have yet?" without
//! writing to the index.
//!
//! ## Comparison Methods
//! - **Fingerprint** - content identity; a renamed or moved photo is still known
//! - **Filename** - name only; weaker, two different photos that share a name
//!   (IMG_0001.CR2 from two cameras) count as the same
//!
//! The method is always chosen explicitly by the caller.

mod comparator;
mod summary;

pub use comparator::{classify, ImportComparator};
pub use summary::{summarize_card, DaySummary};

use crate::error::RawIndexError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// How a file is matched against the index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMethod {
    /// Match on content fingerprint
    #[default]
    Fingerprint,
    /// Match on file name only
    Filename,
}

impl FromStr for ComparisonMethod {
    type Err = RawIndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fingerprint" => Ok(ComparisonMethod::Fingerprint),
            "filename" => Ok(ComparisonMethod::Filename),
            other => Err(RawIndexError::InvalidArgument(format!(
                "unknown comparison method {other:?} (expected \"fingerprint\" or \"filename\")"
            ))),
        }
    }
}

impl std::fmt::Display for ComparisonMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonMethod::Fingerprint => write!(f, "fingerprint"),
            ComparisonMethod::Filename => write!(f, "filename"),
        }
    }
}

/// Whether one file is already in the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub path: PathBuf,
    pub already_indexed: bool,
}

/// Result of comparing files against the index
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// Method used for matching
    pub method: ComparisonMethod,
    /// One entry per classified candidate, in input order
    pub classifications: Vec<Classification>,
    /// Files that could not be read (non-fatal)
    pub errors: Vec<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ImportReport {
    /// Files the index does not know
    pub fn new_files(&self) -> impl Iterator<Item = &PathBuf> + '_ {
        self.classifications
            .iter()
            .filter(|c| !c.already_indexed)
            .map(|c| &c.path)
    }

    /// Number of files the index does not know
    pub fn new_count(&self) -> usize {
        self.new_files().count()
    }

    /// Number of files the index already has
    pub fn known_count(&self) -> usize {
        self.classifications.len() - self.new_count()
    }
}
