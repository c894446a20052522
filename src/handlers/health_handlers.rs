//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks catalog connectivity and that the
//!   bucket listing the profile routes depend on can be read

use crate::routes::routes::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Liveness probe; never performs I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that:
/// 1. Runs `SELECT 1` against the catalog.
/// 2. Lists the catalog buckets.
///
/// HTTP 200 when all checks pass, HTTP 503 otherwise.
pub async fn readyz(State(profiler): State<AppState>) -> impl IntoResponse {
    let sqlite_check = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&*profiler.source().db)
        .await
    {
        Ok(1) => CheckStatus::ok(),
        Ok(v) => CheckStatus::failed(format!("unexpected result: {}", v)),
        Err(e) => CheckStatus::failed(format!("error: {}", e)),
    };

    let catalog_check = match profiler.list_buckets().await {
        Ok(_) => CheckStatus::ok(),
        Err(e) => CheckStatus::failed(format!("could not list buckets: {}", e)),
    };

    let overall_ok = sqlite_check.ok && catalog_check.ok;
    let checks = HashMap::from([("sqlite", sqlite_check), ("catalog", catalog_check)]);

    let body = ReadyResponse {
        status: if overall_ok { "ok" } else { "error" }.into(),
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            ok: false,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{catalog_source::tests::memory_catalog, profiler::Profiler};

    #[tokio::test]
    async fn ready_without_touching_report_dir() {
        let dir = tempfile::tempdir().unwrap();
        let reports = dir.path().join("reports");
        let profiler = Profiler::new(memory_catalog().await, &reports);

        let response = readyz(State(profiler)).await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!reports.exists());
    }

    #[tokio::test]
    async fn missing_schema_is_not_ready() {
        let catalog = memory_catalog().await;
        sqlx::query("DROP TABLE objects")
            .execute(&*catalog.db)
            .await
            .unwrap();
        sqlx::query("DROP TABLE buckets")
            .execute(&*catalog.db)
            .await
            .unwrap();
        let profiler = Profiler::new(catalog, ".");

        let response = readyz(State(profiler)).await.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn liveness_is_ok() {
        let response = healthz().await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
