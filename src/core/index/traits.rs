//! Index backend trait definition.

use super::{BatchOutcome, InsertOutcome, PendingRecord, PhotoRecord, SkipReason, SkippedRecord};
use crate::core::fingerprint::Fingerprint;
use crate::error::IndexError;
use std::collections::HashSet;

/// Trait for index backends
///
/// Implementations must reject a second record with an existing fingerprint
/// atomically; that rejection is how callers learn a photo is already known.
pub trait IndexBackend: Send + Sync {
    /// Whether a record with this fingerprint exists
    fn contains(&self, fingerprint: &Fingerprint) -> Result<bool, IndexError>;

    /// Whether a record with this file name exists
    fn contains_filename(&self, filename: &str) -> Result<bool, IndexError>;

    /// Insert one record. A uniqueness violation is `InsertOutcome::Duplicate`,
    /// not an error.
    fn insert(&self, record: &PendingRecord) -> Result<InsertOutcome, IndexError>;

    /// Insert many records.
    ///
    /// Backends with transactions try the whole batch at once and, if any
    /// record violates uniqueness, fall back to inserting one at a time. This
    /// default only has the fallback.
    fn insert_batch(&self, records: &[PendingRecord]) -> Result<BatchOutcome, IndexError> {
        insert_each(records, |record| self.insert(record))
    }

    /// Look up a record by fingerprint
    fn get(&self, fingerprint: &Fingerprint) -> Result<Option<PhotoRecord>, IndexError>;

    /// Number of stored records
    fn count(&self) -> Result<usize, IndexError>;

    /// Records ordered by id
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<PhotoRecord>, IndexError>;
}

/// Insert records one at a time, collecting the ones that violate uniqueness.
///
/// A conflict with a fingerprint written earlier in the same call is reported
/// as `DuplicateInBatch`; any other conflict as `AlreadyIndexed`.
pub(crate) fn insert_each<F>(records: &[PendingRecord], mut insert: F) -> Result<BatchOutcome, IndexError>
where
    F: FnMut(&PendingRecord) -> Result<InsertOutcome, IndexError>,
{
    let mut outcome = BatchOutcome::default();
    let mut written: HashSet<&Fingerprint> = HashSet::new();

    for record in records {
        match insert(record)? {
            InsertOutcome::Inserted(id) => {
                outcome.inserted.push(id);
                written.insert(&record.fingerprint);
            }
            InsertOutcome::Duplicate => {
                let reason = if written.contains(&record.fingerprint) {
                    SkipReason::DuplicateInBatch
                } else {
                    SkipReason::AlreadyIndexed
                };
                outcome.skipped.push(SkippedRecord {
                    record: record.clone(),
                    reason,
                });
            }
        }
    }

    Ok(outcome)
}
