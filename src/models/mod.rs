//! Data models for the bucket profiler.
//!
//! `bucket` and `object` are rows read from the object store's metadata
//! catalog (they map to database tables via `sqlx::FromRow`). `summary`
//! holds the analysis results handed to the summary writer and serialized
//! as JSON by the HTTP surface.

pub mod bucket;
pub mod object;
pub mod summary;
