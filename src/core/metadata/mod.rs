//! # Metadata Module
//!
//! Reads the timestamp used to date a photo.
//!
//! The filesystem modification time stands in for the capture time. Birth
//! time is not reported consistently across platforms and camera cards
//! (FAT/exFAT), while mtime survives copies made with `cp -p` and is what the
//! camera wrote.

use crate::error::MetadataError;
use chrono::{DateTime, Local, NaiveDateTime, SubsecRound};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Format used for `creation_time` in the index (ISO-8601, no offset)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Best available timestamp for a file, in local time with second precision
pub fn creation_time(path: &Path) -> Result<NaiveDateTime, MetadataError> {
    let metadata = fs::metadata(path).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let modified = metadata.modified().map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(to_local(modified))
}

/// Convert a `SystemTime` to the local naive timestamp stored in the index
pub fn to_local(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local().trunc_subsecs(0)
}

/// Render a timestamp the way it is persisted
pub fn format_timestamp(time: &NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a persisted timestamp
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .or_else(|_| text.parse::<NaiveDateTime>())
        .ok()
}
