//! # Grouping Module
//!
//! Partitions timestamped files into calendar days, which is how a card's
//! content is offered for import ("2024-01-01: 212 files").

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Files sharing a calendar date, in timestamp order
pub type DateGroups = BTreeMap<NaiveDate, Vec<PathBuf>>;

/// Group `(path, timestamp)` pairs by the date component of the timestamp.
///
/// Pairs are stable-sorted by timestamp and then split into runs of equal
/// date, so paths inside a day are in timestamp order and exact ties keep
/// their input order.
pub fn group_by_date<I>(contents: I) -> DateGroups
where
    I: IntoIterator<Item = (PathBuf, NaiveDateTime)>,
{
    let mut sorted: Vec<(PathBuf, NaiveDateTime)> = contents.into_iter().collect();
    sorted.sort_by_key(|(_, stamp)| *stamp);

    let mut groups = DateGroups::new();
    let mut current: Option<(NaiveDate, Vec<PathBuf>)> = None;

    for (path, stamp) in sorted {
        let date = stamp.date();
        if let Some((run_date, paths)) = current.as_mut() {
            if *run_date == date {
                paths.push(path);
                continue;
            }
        }
        if let Some((run_date, paths)) = current.replace((date, vec![path])) {
            groups.insert(run_date, paths);
        }
    }

    if let Some((run_date, paths)) = current {
        groups.insert(run_date, paths);
    }

    groups
}
