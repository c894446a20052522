//! Represents a logical bucket — a top-level container for objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Region reported for buckets whose location constraint is empty.
pub const DEFAULT_REGION: &str = "us-east-1";

/// A storage bucket as recorded in the metadata catalog.
///
/// Only the identity columns are read: the profiler needs the name, the
/// region it lives in and its creation date.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Bucket {
    /// Unique identifier for this bucket (UUID for internal DB use).
    pub id: Uuid,

    /// Globally unique bucket name.
    pub name: String,

    /// Region where the bucket is hosted (e.g. "us-west-2"). May be empty.
    pub region: String,

    /// When this bucket was created.
    pub created_at: DateTime<Utc>,
}

impl Bucket {
    /// The region to report for this bucket.
    ///
    /// An empty location constraint means the default region, the same way
    /// S3's `GetBucketLocation` reports `us-east-1`.
    pub fn effective_region(&self) -> &str {
        if self.region.trim().is_empty() {
            DEFAULT_REGION
        } else {
            &self.region
        }
    }
}
