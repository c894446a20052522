//! Metadata analysis over a bucket's materialized object collection:
//! file-type frequency, size histogram and modification date range.

use crate::models::{
    object::ObjectRecord,
    summary::{DateRange, MetadataSummary, SizeBucket},
};
use std::collections::BTreeMap;

/// File-type label for keys ending in `/`.
pub const DIRECTORY_MARKER: &str = "[directory]";

/// File-type label for keys whose last segment has no suffix.
pub const NO_EXTENSION: &str = "[no extension]";

const KIB: i64 = 1024;
const MIB: i64 = 1024 * KIB;
const GIB: i64 = 1024 * MIB;

/// Histogram layout: label, inclusive lower bound, exclusive upper bound.
/// Ascending, disjoint and exhaustive over `[0, ∞)`.
const SIZE_BUCKETS: [(&str, i64, Option<i64>); 5] = [
    ("0-1KB", 0, Some(KIB)),
    ("1KB-1MB", KIB, Some(MIB)),
    ("1MB-100MB", MIB, Some(100 * MIB)),
    ("100MB-1GB", 100 * MIB, Some(GIB)),
    ("1GB+", GIB, None),
];

/// Build the metadata summary for `objects`.
pub fn analyze_metadata(objects: &[ObjectRecord]) -> MetadataSummary {
    let mut file_type_counts = BTreeMap::new();
    for obj in objects {
        *file_type_counts.entry(file_extension(&obj.key)).or_insert(0) += 1;
    }

    MetadataSummary {
        file_type_counts,
        size_histogram: size_histogram(objects),
        date_range: date_range(objects),
    }
}

/// Classify a key by the suffix of its last path segment, lowercased.
pub fn file_extension(key: &str) -> String {
    if key.ends_with('/') {
        return DIRECTORY_MARKER.to_string();
    }

    let base = key.rsplit('/').next().unwrap_or(key);
    match base.rfind('.') {
        Some(dot) if dot + 1 < base.len() => base[dot + 1..].to_lowercase(),
        _ => NO_EXTENSION.to_string(),
    }
}

/// Count objects into the fixed size buckets.
///
/// Each object lands in the first bucket containing its size, so a size equal
/// to a boundary belongs to the upper bucket.
pub fn size_histogram(objects: &[ObjectRecord]) -> Vec<SizeBucket> {
    let mut buckets: Vec<SizeBucket> = SIZE_BUCKETS
        .iter()
        .map(|&(label, min, max)| SizeBucket {
            label: label.to_string(),
            min,
            max,
            count: 0,
        })
        .collect();

    for obj in objects {
        if let Some(bucket) = buckets.iter_mut().find(|b| b.contains(obj.size)) {
            bucket.count += 1;
        }
    }

    buckets
}

/// Earliest and latest `last_modified`, or `None` for an empty collection.
pub fn date_range(objects: &[ObjectRecord]) -> Option<DateRange> {
    objects.iter().fold(None, |range, obj| {
        let ts = obj.last_modified;
        Some(match range {
            None => DateRange {
                earliest: ts,
                latest: ts,
            },
            Some(DateRange { earliest, latest }) => DateRange {
                earliest: earliest.min(ts),
                latest: latest.max(ts),
            },
        })
    })
}
