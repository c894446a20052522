//! The record-source seam: where object listings and bucket identities come from.
//!
//! The profiler only depends on [`ObjectSource`]; the SQLite catalog in
//! `catalog_source` is the production implementation.

use crate::models::{bucket::Bucket, object::ObjectRecord};
use std::future::Future;
use thiserror::Error;

/// Upper bound on `max_keys` for a single page, as in ListObjectsV2.
pub const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("bucket `{0}` not found")]
    BucketNotFound(String),
    #[error("invalid continuation token")]
    InvalidToken,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// One page of a bucket listing.
#[derive(Debug, Default)]
pub struct ListPage {
    pub records: Vec<ObjectRecord>,
    /// Opaque token for the next page; `None` when the listing is complete.
    pub next_token: Option<String>,
}

/// A paginated supplier of object records and bucket identities.
pub trait ObjectSource: Send + Sync {
    /// Fetch up to `max_keys` records of `bucket`, resuming after `token`.
    fn list_page(
        &self,
        bucket: &str,
        token: Option<&str>,
        max_keys: usize,
    ) -> impl Future<Output = SourceResult<ListPage>> + Send;

    /// Look up the bucket's name, region and creation date.
    fn bucket_identity(&self, bucket: &str) -> impl Future<Output = SourceResult<Bucket>> + Send;

    /// Names of every bucket the source can list.
    fn list_buckets(&self) -> impl Future<Output = SourceResult<Vec<String>>> + Send;
}
