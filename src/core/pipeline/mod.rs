//! # Pipeline Module
//!
//! Builds the index from a directory tree.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Walk the tree and keep RAW candidates
//! 2. **Fingerprint** - Hash candidate content and read timestamps
//! 3. **Write** - Flush pending records to the index in batches
//!
//! ## Parallelism
//! Fingerprinting runs on rayon's pool one batch-sized chunk at a time.
//! Writes go through the index backend one batch at a time.

mod executor;

pub use executor::{
    apply_in_batch_policy, InBatchPolicy, IndexReport, Pipeline, PipelineBuilder, PipelineConfig,
    SkippedFile, DEFAULT_BATCH_SIZE,
};
