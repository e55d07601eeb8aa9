//! Integration tests for card comparison, summaries and transfer.

use assert_fs::prelude::*;
use assert_fs::TempDir;
use chrono::{NaiveDate, NaiveDateTime};
use predicates::prelude::*;
use raw_index::core::grouping::group_by_date;
use raw_index::core::import::{summarize_card, ComparisonMethod, ImportComparator};
use raw_index::core::index::{IndexBackend, SqliteIndex};
use raw_index::core::pipeline::Pipeline;
use raw_index::core::scanner::ExtensionFilter;
use raw_index::core::transfer::copy_into;
use raw_index::RawIndexError;
use std::path::PathBuf;
use std::sync::Arc;

fn card_with_three_frames() -> TempDir {
    let card = TempDir::new().unwrap();
    card.child("DCIM/100CANON/IMG_0001.CR2").write_binary(b"frame one").unwrap();
    card.child("DCIM/100CANON/IMG_0002.CR2").write_binary(b"frame two").unwrap();
    card.child("DCIM/100CANON/IMG_0003.CR2").write_binary(b"frame three").unwrap();
    card.child("DCIM/100CANON/IMG_0003.JPG").write_binary(b"preview").unwrap();
    card
}

fn index_tree(root: &std::path::Path, index: Arc<SqliteIndex>) {
    Pipeline::builder()
        .paths(vec![root.to_path_buf()])
        .index(index)
        .build()
        .run()
        .unwrap();
}

#[test]
fn empty_index_reports_every_frame_new() {
    let card = card_with_three_frames();
    let db = TempDir::new().unwrap();
    let index = SqliteIndex::open(&db.path().join("photo_index.db.sqlite")).unwrap();

    let report = ImportComparator::new(&index, ComparisonMethod::Fingerprint)
        .compare(card.path())
        .unwrap();

    assert_eq!(report.new_count(), 3);
    assert_eq!(report.known_count(), 0);
    assert_eq!(index.count().unwrap(), 0);
}

#[test]
fn indexed_card_reports_every_frame_known() {
    let card = card_with_three_frames();
    let db = TempDir::new().unwrap();
    let index = Arc::new(SqliteIndex::open(&db.path().join("photo_index.db.sqlite")).unwrap());
    index_tree(card.path(), index.clone());

    for method in [ComparisonMethod::Fingerprint, ComparisonMethod::Filename] {
        let report = ImportComparator::new(&*index, method)
            .compare(card.path())
            .unwrap();
        assert_eq!(report.new_count(), 0, "method {method}");
        assert_eq!(report.known_count(), 3, "method {method}");
    }
}

#[test]
fn renamed_copy_is_known_by_fingerprint_only() {
    let library = TempDir::new().unwrap();
    library.child("2024/IMG_0001.CR2").write_binary(b"frame one").unwrap();

    let card = TempDir::new().unwrap();
    card.child("renamed.CR2").write_binary(b"frame one").unwrap();

    let db = TempDir::new().unwrap();
    let index = Arc::new(SqliteIndex::open(&db.path().join("photo_index.db.sqlite")).unwrap());
    index_tree(library.path(), index.clone());

    let by_content = ImportComparator::new(&*index, ComparisonMethod::Fingerprint)
        .compare(card.path())
        .unwrap();
    let by_name = ImportComparator::new(&*index, ComparisonMethod::Filename)
        .compare(card.path())
        .unwrap();

    assert_eq!(by_content.new_count(), 0);
    assert_eq!(by_name.new_count(), 1);
}

#[test]
fn unknown_method_is_rejected() {
    let result = "checksum".parse::<ComparisonMethod>();
    assert!(matches!(result, Err(RawIndexError::InvalidArgument(_))));
}

#[test]
fn summary_groups_card_by_day() {
    let card = card_with_three_frames();
    let db = TempDir::new().unwrap();
    let index = SqliteIndex::open(&db.path().join("photo_index.db.sqlite")).unwrap();
    let folder = card.child("DCIM/100CANON");

    let raw_only = summarize_card(
        folder.path(),
        &index,
        ComparisonMethod::Fingerprint,
        &ExtensionFilter::raw(),
    )
    .unwrap();
    let everything = summarize_card(
        folder.path(),
        &index,
        ComparisonMethod::Fingerprint,
        &ExtensionFilter::accept_all(),
    )
    .unwrap();

    let raw_total: usize = raw_only.iter().map(|d| d.total()).sum();
    let all_total: usize = everything.iter().map(|d| d.total()).sum();
    let all_new: usize = everything.iter().map(|d| d.new_files.len()).sum();
    assert_eq!(raw_total, 3);
    assert_eq!(all_total, 4);
    assert_eq!(all_new, 3);
}

#[test]
fn grouping_splits_on_calendar_day() {
    let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap();
    let groups = group_by_date(vec![
        (PathBuf::from("c"), at("2024-01-02T09:00:00")),
        (PathBuf::from("a"), at("2024-01-01T10:00:00")),
        (PathBuf::from("b"), at("2024-01-01T15:00:00")),
    ]);

    let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[&day(2024, 1, 1)], vec![PathBuf::from("a"), PathBuf::from("b")]);
    assert_eq!(groups[&day(2024, 1, 2)], vec![PathBuf::from("c")]);
}

#[test]
fn new_files_copy_into_library_folder() {
    let card = card_with_three_frames();
    let library = TempDir::new().unwrap();
    library.child("Existing/IMG_0002.CR2").write_binary(b"older copy").unwrap();

    let db = TempDir::new().unwrap();
    let index = SqliteIndex::open(&db.path().join("photo_index.db.sqlite")).unwrap();
    let report = ImportComparator::new(&index, ComparisonMethod::Fingerprint)
        .compare(card.path())
        .unwrap();

    let files: Vec<PathBuf> = report.new_files().cloned().collect();
    let destination = library.child("Existing");
    let result = copy_into(&files, destination.path(), |_, _, _| {}).unwrap();

    assert_eq!(result.copied.len(), 2);
    assert_eq!(result.skipped_existing.len(), 1);
    destination
        .child("IMG_0001.CR2")
        .assert(predicate::path::is_file());
    destination
        .child("IMG_0002.CR2")
        .assert(predicate::str::contains("older copy").from_utf8().from_file_path());
    destination
        .child("IMG_0003.JPG")
        .assert(predicate::path::missing());
}

#[test]
fn same_name_frames_from_two_folders_are_both_copied() {
    let card = TempDir::new().unwrap();
    card.child("DCIM/100CANON/IMG_0001.CR2").write_binary(b"first roll").unwrap();
    card.child("DCIM/101CANON/IMG_0001.CR2").write_binary(b"second roll").unwrap();

    let db = TempDir::new().unwrap();
    let index = SqliteIndex::open(&db.path().join("photo_index.db.sqlite")).unwrap();
    let report = ImportComparator::new(&index, ComparisonMethod::Fingerprint)
        .compare(card.path())
        .unwrap();
    assert_eq!(report.new_count(), 2);

    let library = TempDir::new().unwrap();
    let files: Vec<PathBuf> = report.new_files().cloned().collect();
    let result = copy_into(&files, library.path(), |_, _, _| {}).unwrap();

    assert_eq!(result.copied.len(), 2);
    assert!(result.skipped_existing.is_empty());
    library
        .child("IMG_0001.CR2")
        .assert(predicate::str::contains("first roll").from_utf8().from_file_path());
    library
        .child("IMG_0001_1.CR2")
        .assert(predicate::str::contains("second roll").from_utf8().from_file_path());
}
