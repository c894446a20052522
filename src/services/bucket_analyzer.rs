//! Bucket-level aggregation: object/size totals, per-storage-class
//! statistics and a monthly storage cost estimate.
//!
//! Aggregation is an explicit fold. [`BucketAggregator::observe`] consumes the
//! accumulator and returns the updated one, so a listing can be folded page by
//! page while it streams in and the finished [`BucketSummary`] is a fresh value.

use crate::models::{
    bucket::Bucket,
    object::ObjectRecord,
    summary::{BucketSummary, StorageClassStats},
};
use std::collections::BTreeMap;

/// Storage class assumed for records that do not report one.
pub const DEFAULT_STORAGE_CLASS: &str = "STANDARD";

const BYTES_PER_GIB: f64 = (1u64 << 30) as f64;

/// Approximate price per GiB-month (US East), by storage class.
const STORAGE_PRICING: [(&str, f64); 7] = [
    ("STANDARD", 0.023),
    ("INTELLIGENT_TIERING", 0.023),
    ("STANDARD_IA", 0.0125),
    ("ONEZONE_IA", 0.01),
    ("GLACIER", 0.004),
    ("GLACIER_IR", 0.004),
    ("DEEP_ARCHIVE", 0.00099),
];

/// Running totals for one bucket.
#[derive(Debug, Clone, Default)]
pub struct BucketAggregator {
    total_objects: i64,
    total_size: i64,
    storage_classes: BTreeMap<String, StorageClassStats>,
}

impl BucketAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the totals.
    pub fn observe(mut self, record: &ObjectRecord) -> Self {
        let class = storage_class_or_default(&record.storage_class);

        self.total_objects += 1;
        self.total_size += record.size;

        let stats = self.storage_classes.entry(class.to_string()).or_default();
        stats.count += 1;
        stats.size += record.size;

        self
    }

    pub fn total_objects(&self) -> i64 {
        self.total_objects
    }

    pub fn total_size(&self) -> i64 {
        self.total_size
    }

    /// Finalize the summary for `bucket`, computing the cost estimate.
    pub fn finish(self, bucket: &Bucket, region: impl Into<String>) -> BucketSummary {
        let estimated_cost = estimate_monthly_cost(&self.storage_classes);

        BucketSummary {
            name: bucket.name.clone(),
            region: region.into(),
            creation_date: bucket.created_at,
            total_objects: self.total_objects,
            total_size: self.total_size,
            storage_classes: self.storage_classes,
            estimated_cost,
        }
    }
}

/// Substitute [`DEFAULT_STORAGE_CLASS`] for an empty class name.
pub fn storage_class_or_default(class: &str) -> &str {
    if class.is_empty() {
        DEFAULT_STORAGE_CLASS
    } else {
        class
    }
}

/// Price per GiB-month for `class`; unknown classes are priced as STANDARD.
pub fn price_per_gib_month(class: &str) -> f64 {
    STORAGE_PRICING
        .iter()
        .find(|(name, _)| *name == class)
        .or_else(|| {
            STORAGE_PRICING
                .iter()
                .find(|(name, _)| *name == DEFAULT_STORAGE_CLASS)
        })
        .map(|(_, price)| *price)
        .unwrap_or_default()
}

/// Estimated monthly storage cost in USD.
///
/// Flat per-class pricing only: no tiering, requests or egress.
pub fn estimate_monthly_cost(storage_classes: &BTreeMap<String, StorageClassStats>) -> f64 {
    storage_classes
        .iter()
        .map(|(class, stats)| stats.size as f64 / BYTES_PER_GIB * price_per_gib_month(class))
        .sum()
}
