//! Represents an object record as produced by a listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single object (blob) within a bucket, as seen by the profiler.
///
/// Records are immutable once produced by the source and live only for the
/// duration of one bucket's analysis.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct ObjectRecord {
    /// Object key (path-like identifier within the bucket).
    pub key: String,

    /// Size in bytes.
    #[sqlx(rename = "size_bytes")]
    pub size: i64,

    /// Timestamp when object was last modified.
    pub last_modified: DateTime<Utc>,

    /// Storage class (e.g., STANDARD, GLACIER). Empty when the source did not report one.
    pub storage_class: String,

    /// Entity tag reported by the store.
    pub etag: String,
}
