//! Analysis results produced for one bucket.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Count and accumulated size for one storage class.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StorageClassStats {
    pub count: i64,
    pub size: i64,
}

/// Bucket-level statistics and the monthly cost estimate.
///
/// `total_objects` and `total_size` always equal the sums over
/// `storage_classes`.
#[derive(Serialize, Clone, Debug)]
pub struct BucketSummary {
    pub name: String,
    pub region: String,
    pub creation_date: DateTime<Utc>,
    pub total_objects: i64,
    pub total_size: i64,
    pub storage_classes: BTreeMap<String, StorageClassStats>,
    /// Point estimate in USD per month; storage only.
    pub estimated_cost: f64,
}

/// One bar of the size histogram: `[min, max)`, with `max == None` meaning unbounded.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SizeBucket {
    pub label: String,
    pub min: i64,
    pub max: Option<i64>,
    pub count: i64,
}

impl SizeBucket {
    pub fn contains(&self, size: i64) -> bool {
        size >= self.min && self.max.is_none_or(|max| size < max)
    }
}

/// Earliest and latest modification time across a bucket's objects.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

/// File type, size and age statistics over a bucket's objects.
#[derive(Serialize, Clone, Debug)]
pub struct MetadataSummary {
    pub file_type_counts: BTreeMap<String, i64>,
    pub size_histogram: Vec<SizeBucket>,
    /// `None` when the bucket has no objects.
    pub date_range: Option<DateRange>,
}

/// A group of objects sharing a detected key-naming convention.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub prefix: String,
    pub pattern_name: String,
    pub object_count: i64,
    pub total_size: i64,
    /// First keys seen in this partition, at most three.
    pub example_keys: Vec<String>,
}

/// Everything the profiler produces for a single bucket.
#[derive(Serialize, Clone, Debug)]
pub struct BucketReport {
    pub summary: BucketSummary,
    pub metadata: MetadataSummary,
    /// Empty when no partition structure was detected.
    pub partitions: Vec<Partition>,
}
