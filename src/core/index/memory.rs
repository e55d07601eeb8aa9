//! In-memory index backend for testing.

use super::traits::insert_each;
use super::{BatchOutcome, IndexBackend, InsertOutcome, PendingRecord, PhotoRecord};
use crate::core::fingerprint::Fingerprint;
use crate::error::IndexError;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct State {
    records: Vec<PhotoRecord>,
    by_fingerprint: HashMap<Fingerprint, usize>,
}

impl State {
    fn insert(&mut self, record: &PendingRecord) -> InsertOutcome {
        if self.by_fingerprint.contains_key(&record.fingerprint) {
            return InsertOutcome::Duplicate;
        }

        let id = self.records.last().map_or(1, |r| r.id + 1);
        self.by_fingerprint
            .insert(record.fingerprint.clone(), self.records.len());
        self.records.push(PhotoRecord {
            id,
            filepath: record.filepath.clone(),
            folder: record.folder.clone(),
            filename: record.filename.clone(),
            fingerprint: record.fingerprint.clone(),
            creation_time: record.creation_time,
        });
        InsertOutcome::Inserted(id)
    }
}

/// In-memory index backend
///
/// Enforces the same uniqueness rules as `SqliteIndex`, including the
/// all-or-nothing first attempt of `insert_batch`.
#[derive(Default)]
pub struct InMemoryIndex {
    state: Mutex<State>,
}

impl InMemoryIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, IndexError> {
        self.state.lock().map_err(|_| IndexError::Poisoned {
            path: PathBuf::from("memory"),
        })
    }
}

impl IndexBackend for InMemoryIndex {
    fn contains(&self, fingerprint: &Fingerprint) -> Result<bool, IndexError> {
        Ok(self.lock()?.by_fingerprint.contains_key(fingerprint))
    }

    fn contains_filename(&self, filename: &str) -> Result<bool, IndexError> {
        Ok(self.lock()?.records.iter().any(|r| r.filename == filename))
    }

    fn insert(&self, record: &PendingRecord) -> Result<InsertOutcome, IndexError> {
        Ok(self.lock()?.insert(record))
    }

    fn insert_batch(&self, records: &[PendingRecord]) -> Result<BatchOutcome, IndexError> {
        let mut state = self.lock()?;

        let mut seen = HashSet::new();
        let conflict = records.iter().any(|r| {
            state.by_fingerprint.contains_key(&r.fingerprint) || !seen.insert(&r.fingerprint)
        });

        if !conflict {
            let inserted = records
                .iter()
                .filter_map(|r| match state.insert(r) {
                    InsertOutcome::Inserted(id) => Some(id),
                    InsertOutcome::Duplicate => None,
                })
                .collect();
            return Ok(BatchOutcome {
                inserted,
                skipped: Vec::new(),
                bulk: true,
            });
        }

        let mut outcome = insert_each(records, |record| Ok(state.insert(record)))?;
        outcome.bulk = false;
        Ok(outcome)
    }

    fn get(&self, fingerprint: &Fingerprint) -> Result<Option<PhotoRecord>, IndexError> {
        let state = self.lock()?;
        Ok(state
            .by_fingerprint
            .get(fingerprint)
            .map(|&i| state.records[i].clone()))
    }

    fn count(&self) -> Result<usize, IndexError> {
        Ok(self.lock()?.records.len())
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<PhotoRecord>, IndexError> {
        Ok(self
            .lock()?
            .records
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
