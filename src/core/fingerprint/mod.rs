//! # Fingerprint Module
//!
//! Content fingerprints are the identity of a photo: two files with the same
//! bytes are the same photo no matter where they live or what they are called.
//!
//! ## How It Works
//! 1. Stream the file in 4 KiB chunks, so memory use does not grow with file size
//! 2. Feed every chunk to a 128-bit XXH3 hasher
//! 3. Render the digest as 32 lowercase hex characters
//!
//! ## Example
//! ```rust,ignore
//! use raw_index::core::fingerprint::fingerprint_file;
//!
//! let fp = fingerprint_file(Path::new("/Volumes/EOS_DIGITAL/DCIM/100CANON/IMG_1951.CR2"))?;
//! println!("{}", fp);
//! ```

use crate::error::FingerprintError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::Xxh3;

/// Read size used while streaming file content
pub const CHUNK_SIZE: usize = 4096;

/// Hex-encoded content digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already computed digest (e.g., one read back from the index)
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The digest as stored in the index
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint everything a reader yields
pub fn fingerprint_reader<R: Read>(mut reader: R) -> std::io::Result<Fingerprint> {
    let mut hasher = Xxh3::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(Fingerprint(format!("{:032x}", hasher.digest128())))
}

/// Fingerprint the full content of a file
pub fn fingerprint_file(path: &Path) -> Result<Fingerprint, FingerprintError> {
    let io_error = |source| FingerprintError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    fingerprint_reader(file).map_err(io_error)
}

/// Fingerprint many files in parallel.
///
/// Results line up with `paths`; a failure only affects its own slot.
pub fn fingerprint_files(paths: &[PathBuf]) -> Vec<Result<Fingerprint, FingerprintError>> {
    paths.par_iter().map(|path| fingerprint_file(path)).collect()
}
