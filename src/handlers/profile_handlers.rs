//! HTTP handlers exposing the profiler.
//! Each request runs the full per-bucket analysis and returns the report as
//! JSON; nothing is written to the report directory.

use crate::{errors::AppError, models::summary::BucketReport, routes::routes::AppState};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Query params accepted by `GET /buckets/{bucket}/profile`.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    /// Maximum objects to scan; falls back to the configured limit.
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct BucketList {
    pub buckets: Vec<String>,
}

/// `GET /buckets` — names of all catalog buckets.
pub async fn list_buckets(State(profiler): State<AppState>) -> Result<Json<BucketList>, AppError> {
    let buckets = profiler.list_buckets().await?;
    Ok(Json(BucketList { buckets }))
}

/// `GET /buckets/{bucket}/profile`
pub async fn profile_bucket(
    State(profiler): State<AppState>,
    Path(bucket): Path<String>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<BucketReport>, AppError> {
    let profiler = match query.limit {
        Some(limit) => profiler.with_limit(limit),
        None => profiler,
    };

    // Dropping the request future abandons the fetch, so the token never fires.
    let report = profiler
        .analyze_bucket(&bucket, &CancellationToken::new())
        .await?;

    tracing::debug!(
        bucket = %bucket,
        objects = report.summary.total_objects,
        "Served bucket profile"
    );
    Ok(Json(report))
}
