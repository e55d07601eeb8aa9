//! # Core Module
//!
//! The front-end agnostic indexing engine.
//!
//! ## Modules
//! - `scanner` - Finds RAW candidates on disk
//! - `fingerprint` - Content identity of a file
//! - `metadata` - Creation timestamps
//! - `grouping` - Buckets files by calendar day
//! - `index` - Persists one record per unique photo
//! - `pipeline` - Walks, fingerprints and writes in batches
//! - `import` - Read-only comparison of a card against the index
//! - `transfer` - Copies chosen files into the library

pub mod fingerprint;
pub mod grouping;
pub mod import;
pub mod index;
pub mod metadata;
pub mod pipeline;
pub mod scanner;
pub mod transfer;

// Re-export commonly used types
pub use fingerprint::Fingerprint;
pub use grouping::{group_by_date, DateGroups};
pub use import::{ComparisonMethod, ImportComparator, ImportReport};
pub use index::{IndexBackend, PhotoRecord, SqliteIndex};
pub use pipeline::{IndexReport, Pipeline};
pub use scanner::ExtensionFilter;
