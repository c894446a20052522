//! Partition layout inference from object keys.
//!
//! Detection runs in two phases:
//!
//! 1. **Date patterns.** A fixed list of key shapes, most specific first, is
//!    tried in order. Each key is grouped by the first substring matching the
//!    shape. The first pattern whose matched objects cover strictly more than
//!    half of the collection wins; its groups are returned sorted by prefix.
//! 2. **Hierarchical fallback.** When no date pattern qualifies, keys are
//!    grouped by their top-level prefix (text before the first `/`). Two or
//!    more groups are returned largest first; a single group or none means no
//!    partition structure was detected.

use crate::models::{object::ObjectRecord, summary::Partition};
use regex::Regex;
use std::{collections::BTreeMap, sync::LazyLock};
use tracing::debug;

/// A pattern must match strictly more than this fraction of objects.
pub const COVERAGE_THRESHOLD: f64 = 0.5;

/// Example keys kept per partition.
pub const MAX_EXAMPLE_KEYS: usize = 3;

/// Pattern name reported for top-level prefix groups.
pub const HIERARCHICAL_PATTERN: &str = "hierarchical (top-level prefix)";

/// A named key shape.
struct DatePattern {
    name: &'static str,
    regex: Regex,
}

/// Date shapes in priority order. ASCII digit classes only.
static DATE_PATTERNS: LazyLock<Vec<DatePattern>> = LazyLock::new(|| {
    [
        (
            "year=YYYY/month=MM/day=DD",
            r"year=[0-9]{4}/month=[0-9]{2}/day=[0-9]{2}",
        ),
        ("year=YYYY/month=MM", r"year=[0-9]{4}/month=[0-9]{2}"),
        ("YYYY/MM/DD", r"[0-9]{4}/[0-9]{2}/[0-9]{2}"),
        ("YYYY/MM", r"[0-9]{4}/[0-9]{2}"),
        ("YYYY-MM-DD", r"[0-9]{4}-[0-9]{2}-[0-9]{2}"),
        ("dt=YYYY-MM-DD", r"dt=[0-9]{4}-[0-9]{2}-[0-9]{2}"),
    ]
    .into_iter()
    .map(|(name, pattern)| DatePattern {
        name,
        regex: Regex::new(pattern).expect("date pattern must compile"),
    })
    .collect()
});

/// Detect the best-fitting partition layout for `objects`.
///
/// Returns an empty list when the collection is empty or no structure is found.
pub fn detect_partitions(objects: &[ObjectRecord]) -> Vec<Partition> {
    if objects.is_empty() {
        return Vec::new();
    }

    if let Some(partitions) = detect_date_partitions(objects) {
        return partitions;
    }

    detect_hierarchical_partitions(objects)
}

fn detect_date_partitions(objects: &[ObjectRecord]) -> Option<Vec<Partition>> {
    let total = objects.len();

    for pattern in DATE_PATTERNS.iter() {
        let groups = group_by(objects, pattern.name, |key| {
            pattern.regex.find(key).map(|m| m.as_str().to_string())
        });

        let matched: i64 = groups.values().map(|p| p.object_count).sum();
        let coverage = matched as f64 / total as f64;

        if coverage > COVERAGE_THRESHOLD {
            debug!(
                pattern = pattern.name,
                coverage,
                partitions = groups.len(),
                "Accepted date partition pattern"
            );
            return Some(groups.into_values().collect());
        }

        if matched > 0 {
            debug!(
                pattern = pattern.name,
                coverage, "Date pattern below coverage threshold"
            );
        }
    }

    None
}

fn detect_hierarchical_partitions(objects: &[ObjectRecord]) -> Vec<Partition> {
    let groups = group_by(objects, HIERARCHICAL_PATTERN, |key| {
        key.split_once('/').map(|(top, _)| format!("{top}/"))
    });

    if groups.len() <= 1 {
        debug!(groups = groups.len(), "No hierarchical partitions detected");
        return Vec::new();
    }

    // Groups come out in prefix order; the stable sort keeps that order for
    // equal counts.
    let mut partitions: Vec<Partition> = groups.into_values().collect();
    partitions.sort_by(|a, b| b.object_count.cmp(&a.object_count));
    partitions
}

/// Group objects by the prefix `extract` finds in their key. Objects without
/// a prefix are skipped.
fn group_by<F>(
    objects: &[ObjectRecord],
    pattern_name: &str,
    extract: F,
) -> BTreeMap<String, Partition>
where
    F: Fn(&str) -> Option<String>,
{
    let mut groups: BTreeMap<String, Partition> = BTreeMap::new();

    for obj in objects {
        let Some(prefix) = extract(&obj.key) else {
            continue;
        };

        let partition = groups.entry(prefix).or_insert_with_key(|prefix| Partition {
            prefix: prefix.clone(),
            pattern_name: pattern_name.to_string(),
            object_count: 0,
            total_size: 0,
            example_keys: Vec::new(),
        });

        partition.object_count += 1;
        partition.total_size += obj.size;
        if partition.example_keys.len() < MAX_EXAMPLE_KEYS {
            partition.example_keys.push(obj.key.clone());
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn object(key: &str, size: i64) -> ObjectRecord {
        ObjectRecord {
            key: key.into(),
            size,
            last_modified: Utc::now(),
            storage_class: "STANDARD".into(),
            etag: String::new(),
        }
    }

    fn keys(keys: &[&str]) -> Vec<ObjectRecord> {
        keys.iter().map(|k| object(k, 1)).collect()
    }

    fn prefixes(partitions: &[Partition]) -> Vec<&str> {
        partitions.iter().map(|p| p.prefix.as_str()).collect()
    }

    #[test]
    fn empty_collection_has_no_partitions() {
        assert!(detect_partitions(&[]).is_empty());
    }

    #[test]
    fn most_specific_hive_pattern_wins() {
        let mut objects = Vec::new();
        for i in 0..60 {
            objects.push(object(&format!("year=2023/month=01/day=15/part-{i}.json"), 10));
        }
        for i in 0..40 {
            objects.push(object(&format!("scratch/file-{i}.bin"), 5));
        }

        let partitions = detect_partitions(&objects);

        assert_eq!(partitions.len(), 1);
        let p = &partitions[0];
        assert_eq!(p.pattern_name, "year=YYYY/month=MM/day=DD");
        assert_eq!(p.prefix, "year=2023/month=01/day=15");
        assert_eq!(p.object_count, 60);
        assert_eq!(p.total_size, 600);
        assert_eq!(
            p.example_keys,
            vec![
                "year=2023/month=01/day=15/part-0.json",
                "year=2023/month=01/day=15/part-1.json",
                "year=2023/month=01/day=15/part-2.json",
            ]
        );
    }

    #[test]
    fn coarser_pattern_used_when_finer_lacks_coverage() {
        let objects = keys(&[
            "year=2023/month=01/day=01/a",
            "year=2023/month=02/b",
            "year=2023/month=02/c",
            "other/d",
        ]);

        let partitions = detect_partitions(&objects);

        assert!(partitions.iter().all(|p| p.pattern_name == "year=YYYY/month=MM"));
        assert_eq!(prefixes(&partitions), vec!["year=2023/month=01", "year=2023/month=02"]);
        assert_eq!(partitions[1].object_count, 2);
    }

    #[test]
    fn exactly_half_coverage_is_rejected() {
        let objects = keys(&[
            "2024/01/02/a.parquet",
            "2024/01/03/b.parquet",
            "flat-one",
            "flat-two",
        ]);

        // 50% match YYYY/MM/DD (and YYYY/MM); the remaining keys have no
        // separator, so the fallback finds a single top-level group.
        assert!(detect_partitions(&objects).is_empty());
    }

    #[test]
    fn below_threshold_falls_back_to_hierarchy() {
        let objects = keys(&[
            "events/2024/01/02/a",
            "events/2024/01/03/b",
            "images/cat.png",
            "docs/readme.md",
        ]);

        let partitions = detect_partitions(&objects);

        assert!(partitions.iter().all(|p| p.pattern_name == HIERARCHICAL_PATTERN));
        assert_eq!(prefixes(&partitions), vec!["events/", "docs/", "images/"]);
    }

    #[test]
    fn date_groups_sorted_by_prefix() {
        let objects = keys(&[
            "logs/2024-03-01.log",
            "logs/2023-12-31.log",
            "logs/2024-01-15.log",
            "logs/2023-12-31-b.log",
        ]);

        let partitions = detect_partitions(&objects);

        assert_eq!(partitions[0].pattern_name, "YYYY-MM-DD");
        assert_eq!(
            prefixes(&partitions),
            vec!["2023-12-31", "2024-01-15", "2024-03-01"]
        );
        assert_eq!(partitions[0].object_count, 2);
    }

    #[test]
    fn dt_keys_match_the_plain_date_shape_first() {
        let objects = keys(&["tbl/dt=2024-02-01/x", "tbl/dt=2024-02-02/y"]);

        let partitions = detect_partitions(&objects);

        assert_eq!(partitions[0].pattern_name, "YYYY-MM-DD");
        assert_eq!(prefixes(&partitions), vec!["2024-02-01", "2024-02-02"]);
    }

    #[test]
    fn first_match_in_key_is_used() {
        let objects = keys(&["2020/01/05/backup/2021/02/06/f", "2020/01/05/g"]);

        let partitions = detect_partitions(&objects);

        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].prefix, "2020/01/05");
        assert_eq!(partitions[0].object_count, 2);
    }

    #[test]
    fn hierarchical_ordering_by_count() {
        let mut objects = Vec::new();
        for (prefix, n) in [("misc", 10), ("logs", 70), ("tmp", 20)] {
            for i in 0..n {
                objects.push(object(&format!("{prefix}/item-{i}"), 2));
            }
        }

        let partitions = detect_partitions(&objects);

        assert_eq!(prefixes(&partitions), vec!["logs/", "tmp/", "misc/"]);
        assert_eq!(partitions[0].object_count, 70);
        assert_eq!(partitions[0].total_size, 140);
        assert_eq!(partitions[2].example_keys.len(), MAX_EXAMPLE_KEYS);
    }

    #[test]
    fn hierarchical_ties_break_by_prefix() {
        let objects = keys(&["zeta/a", "alpha/b", "mid/c", "mid/d"]);

        let partitions = detect_partitions(&objects);

        assert_eq!(prefixes(&partitions), vec!["mid/", "alpha/", "zeta/"]);
    }

    #[test]
    fn single_top_level_prefix_is_not_a_partitioning() {
        let objects = keys(&["data/a.csv", "data/b.csv", "data/nested/c.csv"]);

        assert!(detect_partitions(&objects).is_empty());
    }

    #[test]
    fn flat_bucket_has_no_partitions() {
        let objects = keys(&["a.txt", "b.txt", "c.txt"]);

        assert!(detect_partitions(&objects).is_empty());
    }
}
