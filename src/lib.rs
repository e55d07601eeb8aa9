//! # RAW Index
//!
//! Keeps a library of RAW photos free of duplicates.
//!
//! ## Core Idea
//! - **Content identity** - a photo is known by the fingerprint of its bytes,
//!   not by its name or location
//! - **One record per photo** - the index never stores two records with the
//!   same fingerprint, however often a folder is re-indexed
//! - **Read before you copy** - a camera card can be compared against the
//!   index without touching it
//!
//! ## Architecture
//! - `core` - The indexing engine
//! - `events` - Progress reporting for front ends
//! - `error` - Error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{RawIndexError, Result};

/// Initialize tracing for the library.
///
/// Honours `RUST_LOG`, defaulting to `default_level` when it is unset.
/// Calling it twice is harmless; the first subscriber stays installed.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
