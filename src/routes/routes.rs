//! Defines routes for the profiler's HTTP surface.
//!
//! ## Structure
//! - `GET /healthz` — liveness
//! - `GET /readyz` — readiness (catalog connectivity + bucket listing)
//! - `GET /buckets` — list catalog buckets
//! - `GET /buckets/{bucket}/profile` — full bucket report as JSON (supports `limit`)

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        profile_handlers::{list_buckets, profile_bucket},
    },
    services::{catalog_source::CatalogSource, profiler::Profiler},
};
use axum::{Router, routing::get};

/// Shared state carried to every handler.
pub type AppState = Profiler<CatalogSource>;

/// Build and return the router for all profiler routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/buckets", get(list_buckets))
        .route("/buckets/{bucket}/profile", get(profile_bucket))
}
