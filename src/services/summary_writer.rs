//! Renders a [`BucketReport`] as three text files in the output directory:
//! `{bucket}-summary.txt`, `{bucket}-metadata.txt` and `{bucket}-partitions.txt`.

use crate::{
    format::{format_bytes, format_header, format_number, percent},
    models::summary::{BucketReport, BucketSummary, MetadataSummary, Partition},
};
use chrono::SecondsFormat;
use std::{
    fmt::{self, Write as _},
    io,
    path::PathBuf,
};
use tokio::fs;
use tracing::debug;

/// Number of file types listed in the metadata report.
const TOP_FILE_TYPES: usize = 20;

#[derive(Clone, Debug)]
pub struct SummaryWriter {
    output_dir: PathBuf,
}

impl SummaryWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write all three report files, returning their paths.
    pub async fn write_report(&self, report: &BucketReport) -> io::Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir).await?;

        let bucket = &report.summary.name;
        let files = [
            ("summary", render_bucket_summary(&report.summary)),
            ("metadata", render_metadata_summary(bucket, &report.metadata)),
            ("partitions", render_partitions(bucket, &report.partitions)),
        ];

        let mut written = Vec::with_capacity(files.len());
        for (kind, contents) in files {
            let path = self.output_dir.join(format!("{bucket}-{kind}.txt"));
            fs::write(&path, contents).await?;
            debug!(path = %path.display(), "Wrote report file");
            written.push(path);
        }

        Ok(written)
    }
}

pub fn render_bucket_summary(summary: &BucketSummary) -> String {
    render(|out| write_bucket_summary(out, summary))
}

pub fn render_metadata_summary(bucket: &str, metadata: &MetadataSummary) -> String {
    render(|out| write_metadata_summary(out, bucket, metadata))
}

pub fn render_partitions(bucket: &str, partitions: &[Partition]) -> String {
    render(|out| write_partitions(out, bucket, partitions))
}

fn render(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    // Writing into a String is infallible.
    let _ = write(&mut out);
    out
}

fn write_bucket_summary(out: &mut String, summary: &BucketSummary) -> fmt::Result {
    writeln!(out, "{}", format_header(&format!("Bucket Summary: {}", summary.name)))?;
    writeln!(out, "Region:                 {}", summary.region)?;
    writeln!(
        out,
        "Creation Date:          {}",
        summary.creation_date.to_rfc3339_opts(SecondsFormat::Secs, true)
    )?;
    writeln!(out, "Total Objects:          {}", format_number(summary.total_objects))?;
    writeln!(
        out,
        "Total Size:             {} ({} bytes)",
        format_bytes(summary.total_size),
        format_number(summary.total_size)
    )?;
    writeln!(out, "Estimated Monthly Cost: ${:.2}", summary.estimated_cost)?;
    writeln!(out)?;
    writeln!(out, "Storage Classes:")?;

    if summary.storage_classes.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (class, stats) in &summary.storage_classes {
        writeln!(
            out,
            "  {:<22} {:>12} objects  {:>12}  ({:.1}%)",
            class,
            format_number(stats.count),
            format_bytes(stats.size),
            percent(stats.size, summary.total_size)
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "Note: cost is a storage-only estimate at flat US East prices."
    )
}

fn write_metadata_summary(
    out: &mut String,
    bucket: &str,
    metadata: &MetadataSummary,
) -> fmt::Result {
    let total: i64 = metadata.size_histogram.iter().map(|b| b.count).sum();

    writeln!(out, "{}", format_header(&format!("Metadata Summary: {bucket}")))?;

    writeln!(out, "Date Range:")?;
    match &metadata.date_range {
        Some(range) => {
            writeln!(
                out,
                "  Earliest: {}",
                range.earliest.to_rfc3339_opts(SecondsFormat::Secs, true)
            )?;
            writeln!(
                out,
                "  Latest:   {}",
                range.latest.to_rfc3339_opts(SecondsFormat::Secs, true)
            )?;
        }
        None => {
            writeln!(out, "  (no objects)")?;
        }
    }

    let mut file_types: Vec<(&String, &i64)> = metadata.file_type_counts.iter().collect();
    file_types.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    writeln!(out)?;
    writeln!(
        out,
        "File Types ({} distinct):",
        format_number(file_types.len() as i64)
    )?;
    for (ext, count) in file_types.iter().take(TOP_FILE_TYPES) {
        writeln!(
            out,
            "  {:<20} {:>12}  ({:.1}%)",
            ext,
            format_number(**count),
            percent(**count, total)
        )?;
    }
    if file_types.len() > TOP_FILE_TYPES {
        writeln!(out, "  ... and {} more", file_types.len() - TOP_FILE_TYPES)?;
    }

    writeln!(out)?;
    writeln!(out, "Size Distribution:")?;
    for bucket in &metadata.size_histogram {
        writeln!(
            out,
            "  {:<12} {:>12}  ({:.1}%)",
            bucket.label,
            format_number(bucket.count),
            percent(bucket.count, total)
        )?;
    }
    Ok(())
}

fn write_partitions(out: &mut String, bucket: &str, partitions: &[Partition]) -> fmt::Result {
    writeln!(out, "{}", format_header(&format!("Partitions: {bucket}")))?;

    let Some(first) = partitions.first() else {
        return writeln!(out, "No partitions detected.");
    };

    writeln!(out, "Pattern:    {}", first.pattern_name)?;
    writeln!(out, "Partitions: {}", format_number(partitions.len() as i64))?;

    for partition in partitions {
        writeln!(out)?;
        writeln!(out, "{}", partition.prefix)?;
        writeln!(out, "  Objects: {}", format_number(partition.object_count))?;
        writeln!(out, "  Size:    {}", format_bytes(partition.total_size))?;
        writeln!(out, "  Examples:")?;
        for key in &partition.example_keys {
            writeln!(out, "    - {key}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::summary::{DateRange, SizeBucket, StorageClassStats};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn report(partitions: Vec<Partition>) -> BucketReport {
        let created = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        BucketReport {
            summary: BucketSummary {
                name: "lake".into(),
                region: "us-east-1".into(),
                creation_date: created,
                total_objects: 1500,
                total_size: 3 * 1024 * 1024,
                storage_classes: BTreeMap::from([(
                    "STANDARD".to_string(),
                    StorageClassStats {
                        count: 1500,
                        size: 3 * 1024 * 1024,
                    },
                )]),
                estimated_cost: 0.0001,
            },
            metadata: MetadataSummary {
                file_type_counts: BTreeMap::from([
                    ("parquet".to_string(), 1000),
                    ("json".to_string(), 500),
                ]),
                size_histogram: vec![SizeBucket {
                    label: "1KB-1MB".into(),
                    min: 1024,
                    max: Some(1024 * 1024),
                    count: 1500,
                }],
                date_range: Some(DateRange {
                    earliest: created,
                    latest: created,
                }),
            },
            partitions,
        }
    }

    #[tokio::test]
    async fn writes_three_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SummaryWriter::new(dir.path().join("reports"));

        let written = writer.write_report(&report(Vec::new())).await.unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["lake-summary.txt", "lake-metadata.txt", "lake-partitions.txt"]
        );
        for path in &written {
            assert!(path.exists());
        }

        let partitions = std::fs::read_to_string(&written[2]).unwrap();
        assert!(partitions.contains("No partitions detected."));
    }

    #[test]
    fn summary_text_has_totals_and_classes() {
        let text = render_bucket_summary(&report(Vec::new()).summary);

        assert!(text.contains("Bucket Summary: lake"));
        assert!(text.contains("Total Objects:          1,500"));
        assert!(text.contains("3.00 MB (3,145,728 bytes)"));
        assert!(text.contains("Creation Date:          2020-01-02T03:04:05Z"));
        assert!(text.contains("STANDARD"));
        assert!(text.contains("(100.0%)"));
    }

    #[test]
    fn metadata_text_lists_most_common_type_first() {
        let r = report(Vec::new());
        let text = render_metadata_summary("lake", &r.metadata);

        let parquet = text.find("parquet").unwrap();
        let json = text.find("json").unwrap();
        assert!(parquet < json);
        assert!(text.contains("File Types (2 distinct):"));
        assert!(text.contains("1KB-1MB"));
    }

    #[test]
    fn partitions_text_lists_examples() {
        let partitions = vec![Partition {
            prefix: "year=2024/month=01".into(),
            pattern_name: "year=YYYY/month=MM".into(),
            object_count: 2,
            total_size: 2048,
            example_keys: vec!["year=2024/month=01/a".into(), "year=2024/month=01/b".into()],
        }];

        let text = render_partitions("lake", &partitions);

        assert!(text.contains("Pattern:    year=YYYY/month=MM"));
        assert!(text.contains("    - year=2024/month=01/b"));
        assert!(text.contains("  Size:    2.00 KB"));
    }
}
