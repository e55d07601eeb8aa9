//! Per-day overview of a card, used to decide what to import.

use super::{classify, ComparisonMethod};
use crate::core::grouping::group_by_date;
use crate::core::index::IndexBackend;
use crate::core::scanner::{list_card, ExtensionFilter};
use crate::error::RawIndexError;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Files shot on one day and how many of them are new
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Files in timestamp order
    pub files: Vec<PathBuf>,
    /// Files the index does not have yet
    pub new_files: Vec<PathBuf>,
}

impl DaySummary {
    /// Number of files on this day
    pub fn total(&self) -> usize {
        self.files.len()
    }
}

/// Summarize the top level of a card directory by day.
///
/// `filter` picks which files are listed (RAW only, or every file when
/// thumbnails matter too). New-file detection only considers RAW files, so
/// a listed JPEG never counts as new.
pub fn summarize_card(
    card: &Path,
    index: &dyn IndexBackend,
    method: ComparisonMethod,
    filter: &ExtensionFilter,
) -> Result<Vec<DaySummary>, RawIndexError> {
    let listing = list_card(card, filter)?;
    let paths: Vec<PathBuf> = listing.iter().map(|(path, _)| path.clone()).collect();

    let report = classify(&paths, index, method)?;
    let new: HashSet<&PathBuf> = report.new_files().collect();

    let summaries = group_by_date(listing)
        .into_iter()
        .map(|(date, files)| {
            let new_files = files.iter().filter(|f| new.contains(f)).cloned().collect();
            DaySummary {
                date,
                files,
                new_files,
            }
        })
        .collect();

    Ok(summaries)
}
