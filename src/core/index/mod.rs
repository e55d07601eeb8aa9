//! # Index Module
//!
//! The persistent record of every photo already in the library, keyed by
//! content fingerprint.
//!
//! ## Invariant
//! No two records share a fingerprint. The backend's unique constraint is the
//! only thing that decides whether a photo is already known; callers never
//! check-then-insert.
//!
//! ## Backends
//! - `SqliteIndex` - Persistent storage using SQLite
//! - `InMemoryIndex` - For testing

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryIndex;
pub use sqlite::SqliteIndex;
pub use traits::IndexBackend;

use crate::core::fingerprint::Fingerprint;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A record waiting in a batch, not yet written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRecord {
    /// Absolute path at indexing time
    pub filepath: PathBuf,
    /// Name of the directory holding the file
    pub folder: String,
    /// File name including extension
    pub filename: String,
    /// Content digest
    pub fingerprint: Fingerprint,
    /// Modification time at indexing time
    pub creation_time: NaiveDateTime,
}

impl PendingRecord {
    /// Build a record, deriving `folder` and `filename` from the path
    pub fn new(filepath: PathBuf, fingerprint: Fingerprint, creation_time: NaiveDateTime) -> Self {
        let filename = file_name_of(&filepath);
        let folder = filepath
            .parent()
            .map(file_name_of)
            .unwrap_or_default();

        Self {
            filepath,
            folder,
            filename,
            fingerprint,
            creation_time,
        }
    }
}

/// A record stored in the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Surrogate key assigned by the store
    pub id: i64,
    pub filepath: PathBuf,
    pub folder: String,
    pub filename: String,
    pub fingerprint: Fingerprint,
    pub creation_time: NaiveDateTime,
}

/// Result of a single insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Written with the given id
    Inserted(i64),
    /// The fingerprint is already present
    Duplicate,
}

/// Why a record was not written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A record with this fingerprint was already in the index
    AlreadyIndexed,
    /// Another record in the same batch has this fingerprint
    DuplicateInBatch,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyIndexed => write!(f, "already indexed"),
            SkipReason::DuplicateInBatch => write!(f, "duplicate within batch"),
        }
    }
}

/// A record that was not written, with the reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub record: PendingRecord,
    pub reason: SkipReason,
}

/// Result of writing a batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Ids of written records, in request order
    pub inserted: Vec<i64>,
    /// Records that violated uniqueness
    pub skipped: Vec<SkippedRecord>,
    /// True when the single bulk transaction succeeded; false when records
    /// were retried one at a time
    pub bulk: bool,
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
