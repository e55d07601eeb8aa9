//! # raw-index CLI
//!
//! Command-line interface for the RAW photo index.
//!
//! ## Usage
//! ```bash
//! raw-index index ~/Pictures/RAW
//! raw-index import /Volumes/EOS_DIGITAL/DCIM/100CANON --method fingerprint
//! raw-index summary /Volumes/EOS_DIGITAL/DCIM/100CANON
//! ```

mod cli;

use raw_index::Result;

fn main() -> Result<()> {
    cli::run()
}
