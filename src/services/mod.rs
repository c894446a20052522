//! Core analysis pipeline and its collaborators.
//!
//! - `bucket_analyzer`, `metadata_analyzer`, `partition_detector`: the pure
//!   analysis over object records.
//! - `object_source`, `catalog_source`: where records come from.
//! - `summary_writer`: where reports go.
//! - `profiler`: ties them together per bucket and across buckets.

pub mod bucket_analyzer;
pub mod catalog_source;
pub mod metadata_analyzer;
pub mod object_source;
pub mod partition_detector;
pub mod profiler;
pub mod summary_writer;
