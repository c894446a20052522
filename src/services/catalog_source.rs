//! src/services/catalog_source.rs
//!
//! CatalogSource — reads object listings and bucket identities from the
//! SQLite metadata catalog of an S3-compatible object store. Listing uses
//! keyset pagination over `key` with opaque continuation tokens, mirroring
//! ListObjectsV2 semantics. A token carries the bucket id alongside the last
//! key, so only the first page resolves the bucket name. Soft-deleted objects
//! are never listed.

use crate::{
    models::{bucket::Bucket, object::ObjectRecord},
    services::object_source::{ListPage, MAX_PAGE_SIZE, ObjectSource, SourceError, SourceResult},
};
use base64::{Engine as _, engine::general_purpose};
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Schema of the catalog, applied by `--migrate` and by tests.
const INIT_MIGRATION: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Clone)]
pub struct CatalogSource {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

impl CatalogSource {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Fetch bucket identity columns from SQLite.
    ///
    /// Returns BucketNotFound if missing.
    async fn fetch_bucket(&self, bucket: &str) -> SourceResult<Bucket> {
        sqlx::query_as::<Sqlite, Bucket>(
            "SELECT id, name, region, created_at FROM buckets WHERE name = ?",
        )
        .bind(bucket)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => SourceError::BucketNotFound(bucket.to_string()),
            other => SourceError::Sqlx(other),
        })
    }
}

impl ObjectSource for CatalogSource {
    /// List one page of live objects in lexicographic key order.
    ///
    /// Fetches `max_keys + 1` rows to learn whether another page exists
    /// without a separate count query.
    async fn list_page(
        &self,
        bucket: &str,
        token: Option<&str>,
        max_keys: usize,
    ) -> SourceResult<ListPage> {
        let (bucket_id, after) = match token {
            Some(token) => {
                let (id, key) = decode_continuation_token(token)?;
                (id, Some(key))
            }
            None => (self.fetch_bucket(bucket).await?.id, None),
        };
        let max_keys = max_keys.clamp(1, MAX_PAGE_SIZE);
        let fetch_limit = max_keys + 1;

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT key, size_bytes, last_modified, \
             COALESCE(storage_class, '') AS storage_class, COALESCE(etag, '') AS etag \
             FROM objects WHERE bucket_id = ",
        );
        builder.push_bind(bucket_id);
        builder.push(" AND is_deleted = 0");

        if let Some(after) = after {
            builder.push(" AND key > ");
            builder.push_bind(after);
        }

        builder.push(" ORDER BY key ASC LIMIT ");
        builder.push_bind(fetch_limit as i64);

        let mut records: Vec<ObjectRecord> =
            builder.build_query_as().fetch_all(&*self.db).await?;

        let mut next_token = None;
        if records.len() == fetch_limit {
            records.pop();
            next_token = records
                .last()
                .map(|last| encode_continuation_token(bucket_id, &last.key));
        }

        debug!(
            bucket,
            records = records.len(),
            truncated = next_token.is_some(),
            "Listed catalog page"
        );

        Ok(ListPage {
            records,
            next_token,
        })
    }

    async fn bucket_identity(&self, bucket: &str) -> SourceResult<Bucket> {
        self.fetch_bucket(bucket).await
    }

    async fn list_buckets(&self) -> SourceResult<Vec<String>> {
        let names = sqlx::query_scalar::<Sqlite, String>("SELECT name FROM buckets ORDER BY name")
            .fetch_all(&*self.db)
            .await?;
        Ok(names)
    }
}

/// Apply the catalog schema statement by statement.
pub async fn run_migrations(db: &SqlitePool) -> SourceResult<usize> {
    let statements = INIT_MIGRATION
        .split(';')
        .map(strip_sql_comments)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    for stmt in &statements {
        debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(db).await?;
    }

    Ok(statements.len())
}

fn strip_sql_comments(chunk: &str) -> String {
    chunk
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Token layout before base64: `{bucket_id}:{last_key}`.
fn encode_continuation_token(bucket_id: Uuid, key: &str) -> String {
    general_purpose::STANDARD.encode(format!("{}:{}", bucket_id, key))
}

fn decode_continuation_token(token: &str) -> SourceResult<(Uuid, String)> {
    let raw = general_purpose::STANDARD
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or(SourceError::InvalidToken)?;
    let (id, key) = raw.split_once(':').ok_or(SourceError::InvalidToken)?;
    let id = Uuid::parse_str(id).map_err(|_| SourceError::InvalidToken)?;
    Ok((id, key.to_string()))
}
