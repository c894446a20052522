//! Profiler — runs the per-bucket analysis pipeline and the bounded
//! multi-bucket worker pool.
//!
//! One bucket: resolve identity, fetch the listing page by page while folding
//! records into the bucket aggregate, then run metadata analysis and partition
//! detection over the materialized collection. Several buckets: at most
//! `concurrency` pipelines run at once; each failure is recorded against its
//! bucket and the remaining buckets carry on.

use crate::{
    models::{object::ObjectRecord, summary::BucketReport},
    services::{
        bucket_analyzer::BucketAggregator,
        metadata_analyzer::analyze_metadata,
        object_source::{MAX_PAGE_SIZE, ObjectSource, SourceError},
        partition_detector::detect_partitions,
        summary_writer::SummaryWriter,
    },
};
use futures::{StreamExt, stream};
use std::{io, path::PathBuf, sync::Mutex};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Default cap on buckets profiled concurrently.
pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to list objects in bucket `{bucket}`: {source}")]
    SourceUnavailable {
        bucket: String,
        #[source]
        source: SourceError,
    },
    #[error("failed to resolve bucket `{bucket}`: {source}")]
    IdentityResolution {
        bucket: String,
        #[source]
        source: SourceError,
    },
    #[error("profiling of bucket `{0}` was cancelled")]
    Cancelled(String),
    #[error("failed to write reports for bucket `{bucket}`: {source}")]
    Write {
        bucket: String,
        #[source]
        source: io::Error,
    },
}

pub type ProfileResult<T> = Result<T, ProfileError>;

/// Aggregate outcome of a multi-bucket run.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub total: usize,
    pub succeeded: usize,
    /// Failed buckets with the cause, in completion order.
    pub failed: Vec<(String, String)>,
}

/// Shared tally of a multi-bucket run. Only touched between pipelines.
#[derive(Debug, Default)]
struct Tally {
    processed: usize,
    outcome: RunOutcome,
}

#[derive(Clone)]
pub struct Profiler<S> {
    source: S,
    writer: SummaryWriter,
    /// Maximum records fetched per bucket; 0 means unlimited.
    limit: u64,
}

impl<S: ObjectSource> Profiler<S> {
    pub fn new(source: S, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            writer: SummaryWriter::new(output_dir),
            limit: 0,
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Names of every bucket the source knows about.
    pub async fn list_buckets(&self) -> Result<Vec<String>, SourceError> {
        self.source.list_buckets().await
    }

    /// Run the full analysis for one bucket and return the report.
    pub async fn analyze_bucket(
        &self,
        bucket: &str,
        cancel: &CancellationToken,
    ) -> ProfileResult<BucketReport> {
        let identity = self.source.bucket_identity(bucket).await.map_err(|source| {
            ProfileError::IdentityResolution {
                bucket: bucket.to_string(),
                source,
            }
        })?;

        let (aggregator, objects) = self.fetch_objects(bucket, cancel).await?;
        let summary = aggregator.finish(&identity, identity.effective_region());
        info!(
            bucket,
            objects = summary.total_objects,
            bytes = summary.total_size,
            "Listed bucket"
        );

        let metadata = analyze_metadata(&objects);
        debug!(bucket, file_types = metadata.file_type_counts.len(), "Analyzed metadata");

        let partitions = detect_partitions(&objects);
        match partitions.first() {
            Some(p) => info!(
                bucket,
                pattern = %p.pattern_name,
                partitions = partitions.len(),
                "Detected partitions"
            ),
            None => info!(bucket, "No partitions detected"),
        }

        Ok(BucketReport {
            summary,
            metadata,
            partitions,
        })
    }

    /// Analyze one bucket and write its three report files.
    pub async fn profile_bucket(
        &self,
        bucket: &str,
        cancel: &CancellationToken,
    ) -> ProfileResult<Vec<PathBuf>> {
        let report = self.analyze_bucket(bucket, cancel).await?;
        let written = self
            .writer
            .write_report(&report)
            .await
            .map_err(|source| ProfileError::Write {
                bucket: bucket.to_string(),
                source,
            })?;

        for path in &written {
            info!(bucket, path = %path.display(), "Report written");
        }
        Ok(written)
    }

    /// Profile several buckets with at most `concurrency` in flight.
    ///
    /// Individual failures never abort the run.
    pub async fn profile_many(
        &self,
        buckets: Vec<String>,
        concurrency: usize,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let total = buckets.len();
        let workers = concurrency.clamp(1, total.max(1));
        let tally = Mutex::new(Tally {
            processed: 0,
            outcome: RunOutcome {
                total,
                ..RunOutcome::default()
            },
        });

        info!(total, workers, "Profiling buckets concurrently");

        stream::iter(buckets)
            .for_each_concurrent(workers, |bucket| {
                let tally = &tally;
                async move {
                    let result = self.profile_bucket(&bucket, cancel).await;

                    let mut tally = tally.lock().unwrap_or_else(|e| e.into_inner());
                    tally.processed += 1;
                    let progress = format!("{}/{}", tally.processed, total);
                    match result {
                        Ok(_) => {
                            info!(%progress, bucket = %bucket, "Bucket profiled");
                            tally.outcome.succeeded += 1;
                        }
                        Err(err) => {
                            error!(%progress, bucket = %bucket, error = %err, "Bucket failed");
                            tally.outcome.failed.push((bucket, err.to_string()));
                        }
                    }
                }
            })
            .await;

        tally.into_inner().unwrap_or_else(|e| e.into_inner()).outcome
    }

    /// Page through the bucket listing, folding each record into the
    /// aggregate as it arrives. Stops early once `limit` records are held.
    async fn fetch_objects(
        &self,
        bucket: &str,
        cancel: &CancellationToken,
    ) -> ProfileResult<(BucketAggregator, Vec<ObjectRecord>)> {
        let mut aggregator = BucketAggregator::new();
        let mut objects = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let fetched = aggregator.total_objects() as u64;
            if self.limit > 0 && fetched >= self.limit {
                info!(bucket, limit = self.limit, "Reached object limit");
                break;
            }

            let max_keys = if self.limit > 0 {
                (self.limit - fetched).min(MAX_PAGE_SIZE as u64) as usize
            } else {
                MAX_PAGE_SIZE
            };

            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(ProfileError::Cancelled(bucket.to_string()));
                }
                page = self.source.list_page(bucket, token.as_deref(), max_keys) => {
                    page.map_err(|source| ProfileError::SourceUnavailable {
                        bucket: bucket.to_string(),
                        source,
                    })?
                }
            };

            for record in page.records {
                aggregator = aggregator.observe(&record);
                objects.push(record);
            }
            debug!(
                bucket,
                processed = aggregator.total_objects(),
                bytes = aggregator.total_size(),
                "Processed objects"
            );

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok((aggregator, objects))
    }
}
