//! Integration tests for the indexing pipeline.
//!
//! These tests run the pipeline end to end against an on-disk SQLite index:
//! - Re-indexing an unchanged tree
//! - Copies of one photo in different folders
//! - Recovery when part of a batch is already known
//! - Dry runs
//! - Unreadable files and storage failures mid-run

use assert_fs::prelude::*;
use assert_fs::TempDir;
use chrono::NaiveDateTime;
use predicates::prelude::*;
use raw_index::core::fingerprint::{fingerprint_file, Fingerprint};
use raw_index::core::index::{
    BatchOutcome, InMemoryIndex, IndexBackend, InsertOutcome, PendingRecord, PhotoRecord,
    SkipReason, SqliteIndex,
};
use raw_index::core::pipeline::{InBatchPolicy, Pipeline};
use raw_index::error::IndexError;
use raw_index::events::{Event, EventChannel, PipelineEvent};
use raw_index::RawIndexError;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn open_index(dir: &TempDir) -> Arc<SqliteIndex> {
    Arc::new(SqliteIndex::open(&dir.path().join("photo_index.db.sqlite")).unwrap())
}

fn stamp() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2024-01-01T10:00:00", "%Y-%m-%dT%H:%M:%S").unwrap()
}

fn assert_unique_fingerprints(index: &dyn IndexBackend) {
    let records = index.list(usize::MAX, 0).unwrap();
    let unique: HashSet<&Fingerprint> = records.iter().map(|r| &r.fingerprint).collect();
    assert_eq!(unique.len(), records.len());
}

/// Delegates to an in-memory index but fails the second batch write.
struct FailingIndex {
    inner: InMemoryIndex,
    flushes: AtomicUsize,
}

impl FailingIndex {
    fn new() -> Self {
        Self {
            inner: InMemoryIndex::new(),
            flushes: AtomicUsize::new(0),
        }
    }
}

impl IndexBackend for FailingIndex {
    fn contains(&self, fingerprint: &Fingerprint) -> Result<bool, IndexError> {
        self.inner.contains(fingerprint)
    }

    fn contains_filename(&self, filename: &str) -> Result<bool, IndexError> {
        self.inner.contains_filename(filename)
    }

    fn insert(&self, record: &PendingRecord) -> Result<InsertOutcome, IndexError> {
        self.inner.insert(record)
    }

    fn insert_batch(&self, records: &[PendingRecord]) -> Result<BatchOutcome, IndexError> {
        if self.flushes.fetch_add(1, Ordering::SeqCst) == 1 {
            return Err(IndexError::StorageUnavailable {
                path: PathBuf::from("/data/photo_index.db.sqlite"),
                reason: "disk full".to_string(),
            });
        }
        self.inner.insert_batch(records)
    }

    fn get(&self, fingerprint: &Fingerprint) -> Result<Option<PhotoRecord>, IndexError> {
        self.inner.get(fingerprint)
    }

    fn count(&self) -> Result<usize, IndexError> {
        self.inner.count()
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<PhotoRecord>, IndexError> {
        self.inner.list(limit, offset)
    }
}

#[test]
fn pipeline_handles_empty_directory() {
    let photos = TempDir::new().unwrap();
    let db = TempDir::new().unwrap();

    let pipeline = Pipeline::builder()
        .paths(vec![photos.path().to_path_buf()])
        .index(open_index(&db))
        .build();

    let report = pipeline.run().unwrap();

    assert_eq!(report.total_candidates, 0);
    assert_eq!(report.inserted, 0);
    assert_eq!(report.batches_flushed, 0);
}

#[test]
fn pipeline_rejects_nonexistent_root() {
    let pipeline = Pipeline::builder()
        .paths(vec![PathBuf::from("/nonexistent/path/that/does/not/exist")])
        .build();

    assert!(pipeline.run().is_err());
}

#[test]
fn reindexing_unchanged_tree_inserts_nothing() {
    let photos = TempDir::new().unwrap();
    photos.child("2024-01-01/IMG_0001.CR2").write_binary(b"first").unwrap();
    photos.child("2024-01-01/IMG_0002.CR2").write_binary(b"second").unwrap();
    photos.child("2024-01-02/DSC_0100.NEF").write_binary(b"third").unwrap();
    photos.child("2024-01-02/notes.txt").write_str("not a photo").unwrap();

    let db = TempDir::new().unwrap();
    let index = open_index(&db);

    let first = Pipeline::builder()
        .paths(vec![photos.path().to_path_buf()])
        .index(index.clone())
        .build()
        .run()
        .unwrap();
    assert_eq!(first.total_candidates, 3);
    assert_eq!(first.inserted, 3);

    // A fresh handle on the same file sees the committed records.
    let reopened = open_index(&db);
    let second = Pipeline::builder()
        .paths(vec![photos.path().to_path_buf()])
        .index(reopened.clone())
        .build()
        .run()
        .unwrap();

    assert_eq!(second.inserted, 0);
    assert_eq!(second.already_indexed(), 3);
    assert_eq!(reopened.count().unwrap(), 3);
    assert_unique_fingerprints(&*reopened);
}

#[test]
fn copies_in_different_folders_are_indexed_once() {
    let photos = TempDir::new().unwrap();
    photos.child("card-a/IMG_0001.CR2").write_binary(b"same frame").unwrap();
    photos.child("card-b/IMG_0001.CR2").write_binary(b"same frame").unwrap();
    photos.child("card-b/IMG_0002.CR2").write_binary(b"other frame").unwrap();

    let db = TempDir::new().unwrap();
    let index = open_index(&db);

    let report = Pipeline::builder()
        .paths(vec![photos.path().to_path_buf()])
        .index(index.clone())
        .build()
        .run()
        .unwrap();

    assert_eq!(report.inserted, 2);
    assert_eq!(report.duplicates_in_batch(), 1);

    // The walk is name-ordered, so the copy under card-a is the one kept.
    let fingerprint = fingerprint_file(photos.child("card-a/IMG_0001.CR2").path()).unwrap();
    let stored = index.get(&fingerprint).unwrap().unwrap();
    assert_eq!(stored.folder, "card-a");
    assert_unique_fingerprints(&*index);
}

#[test]
fn drop_all_policy_commits_neither_copy() {
    let photos = TempDir::new().unwrap();
    photos.child("a/IMG_0001.ARW").write_binary(b"same frame").unwrap();
    photos.child("b/IMG_0001.ARW").write_binary(b"same frame").unwrap();
    photos.child("b/IMG_0002.ARW").write_binary(b"unique frame").unwrap();

    let db = TempDir::new().unwrap();
    let index = open_index(&db);

    let report = Pipeline::builder()
        .paths(vec![photos.path().to_path_buf()])
        .index(index.clone())
        .in_batch_policy(InBatchPolicy::DropAll)
        .build()
        .run()
        .unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(report.duplicates_in_batch(), 2);

    let fingerprint = fingerprint_file(photos.child("a/IMG_0001.ARW").path()).unwrap();
    assert!(!index.contains(&fingerprint).unwrap());
}

#[test]
fn batch_with_one_known_record_commits_the_rest() {
    let photos = TempDir::new().unwrap();
    for i in 1..=5 {
        photos
            .child(format!("IMG_000{i}.DNG"))
            .write_binary(format!("frame {i}").as_bytes())
            .unwrap();
    }

    let db = TempDir::new().unwrap();
    let index = open_index(&db);

    // Seed the store with the third frame under another path.
    let known = photos.child("IMG_0003.DNG");
    index
        .insert(&PendingRecord::new(
            PathBuf::from("/library/old/IMG_0003.DNG"),
            fingerprint_file(known.path()).unwrap(),
            stamp(),
        ))
        .unwrap();

    let report = Pipeline::builder()
        .paths(vec![photos.path().to_path_buf()])
        .index(index.clone())
        .batch_size(5)
        .build()
        .run()
        .unwrap();

    assert_eq!(report.inserted, 4);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::AlreadyIndexed);
    assert!(report.skipped[0].path.ends_with("IMG_0003.DNG"));
    assert_eq!(report.fallback_flushes, 1);
    assert_eq!(index.count().unwrap(), 5);
}

#[test]
fn small_batches_flush_repeatedly() {
    let photos = TempDir::new().unwrap();
    for i in 0..7 {
        photos
            .child(format!("DSC_{i:04}.NEF"))
            .write_binary(format!("frame {i}").as_bytes())
            .unwrap();
    }

    let db = TempDir::new().unwrap();
    let report = Pipeline::builder()
        .paths(vec![photos.path().to_path_buf()])
        .index(open_index(&db))
        .batch_size(3)
        .build()
        .run()
        .unwrap();

    assert_eq!(report.inserted, 7);
    assert_eq!(report.batches_flushed, 3);
    assert_eq!(report.fallback_flushes, 0);
}

#[test]
fn dry_run_leaves_database_untouched() {
    let photos = TempDir::new().unwrap();
    photos.child("IMG_0001.CR2").write_binary(b"frame").unwrap();

    let db = TempDir::new().unwrap();
    let index = open_index(&db);

    let report = Pipeline::builder()
        .paths(vec![photos.path().to_path_buf()])
        .index(index.clone())
        .dry_run(true)
        .build()
        .run()
        .unwrap();

    assert_eq!(report.previewed.len(), 1);
    assert_eq!(report.previewed[0].filename, "IMG_0001.CR2");
    assert_eq!(report.inserted, 0);
    assert_eq!(index.count().unwrap(), 0);
}

#[test]
fn hidden_directories_are_skipped_unless_requested() {
    let photos = TempDir::new().unwrap();
    photos.child(".trash/IMG_0001.CR2").write_binary(b"deleted").unwrap();
    photos.child("IMG_0002.CR2").write_binary(b"kept").unwrap();

    let db = TempDir::new().unwrap();
    let default_run = Pipeline::builder()
        .paths(vec![photos.path().to_path_buf()])
        .index(open_index(&db))
        .dry_run(true)
        .build()
        .run()
        .unwrap();
    let hidden_run = Pipeline::builder()
        .paths(vec![photos.path().to_path_buf()])
        .include_hidden(true)
        .dry_run(true)
        .build()
        .run()
        .unwrap();

    assert_eq!(default_run.total_candidates, 1);
    assert_eq!(hidden_run.total_candidates, 2);
}

#[test]
fn database_file_is_created_on_first_open() {
    let db = TempDir::new().unwrap();
    let file = db.child("nested/dir/photo_index.db.sqlite");
    file.assert(predicate::path::missing());

    SqliteIndex::open(file.path()).unwrap();

    file.assert(predicate::path::is_file());
}

#[cfg(unix)]
#[test]
fn unreadable_file_is_reported_and_the_rest_indexed() {
    let photos = TempDir::new().unwrap();
    photos.child("IMG_0001.CR2").write_binary(b"first").unwrap();
    photos.child("IMG_0002.CR2").write_binary(b"second").unwrap();
    photos.child("IMG_0003.CR2").write_binary(b"third").unwrap();
    std::os::unix::fs::symlink(
        photos.path().join("gone.CR2"),
        photos.path().join("IMG_0009.CR2"),
    )
    .unwrap();

    let db = TempDir::new().unwrap();
    let index = open_index(&db);
    let report = Pipeline::builder()
        .paths(vec![photos.path().to_path_buf()])
        .index(index.clone())
        .build()
        .run()
        .unwrap();

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("IMG_0009.CR2"));
    assert_eq!(report.inserted, 3);
    assert_eq!(index.count().unwrap(), 3);
}

#[test]
fn storage_failure_keeps_earlier_batches_and_stops() {
    let photos = TempDir::new().unwrap();
    for i in 1..=4 {
        photos
            .child(format!("IMG_000{i}.CR2"))
            .write_binary(format!("frame {i}").as_bytes())
            .unwrap();
    }

    let index = Arc::new(FailingIndex::new());
    let (sender, receiver) = EventChannel::new();
    let result = Pipeline::builder()
        .paths(vec![photos.path().to_path_buf()])
        .index(index.clone())
        .batch_size(2)
        .build()
        .run_with_events(&sender);
    drop(sender);

    assert!(matches!(result, Err(RawIndexError::Index(_))));
    assert_eq!(index.inner.count().unwrap(), 2);
    assert!(receiver
        .iter()
        .any(|e| matches!(e, Event::Pipeline(PipelineEvent::Error { .. }))));
}
