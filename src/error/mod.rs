//! # Error Module
//!
//! Error types for the RAW photo index.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Separate fatal from per-file** - a single unreadable file is reported
//!   and skipped, while an unusable index database stops the operation

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum RawIndexError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Fingerprint error: {0}")]
    Fingerprint(#[from] FingerprintError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors that occur while walking a directory tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while fingerprinting file content
#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while reading filesystem metadata
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read metadata for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur with the index database
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Index database at {path} is unavailable: {reason}")]
    StorageUnavailable { path: PathBuf, reason: String },

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Index lock poisoned at {path}. Restart the operation.")]
    Poisoned { path: PathBuf },
}

/// Errors that stop a file transfer before any file is copied
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Cannot create destination folder {path}: {source}")]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<rusqlite::Error> for IndexError {
    fn from(err: rusqlite::Error) -> Self {
        IndexError::QueryFailed(err.to_string())
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, RawIndexError>;
