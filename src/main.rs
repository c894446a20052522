use anyhow::{Context, Result};
use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{
    io::{self, BufRead, ErrorKind, Write},
    path::Path,
    str::FromStr,
    sync::Arc,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod format;
mod handlers;
mod models;
mod routes;
mod services;

use config::{AppConfig, Mode, ProfileRequest};
use services::{
    catalog_source::{CatalogSource, run_migrations},
    profiler::Profiler,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    // Logs go to stderr so stdout stays clean for prompts and the run summary.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    // --- Parse config + run mode ---
    let (cfg, mode) = AppConfig::from_env_and_args()?;

    tracing::debug!("Starting bucket-profiler with config: {:?}", cfg);

    // --- Initialize SQLite connection ---
    let migrate = mode == Mode::Migrate;
    let db = Arc::new(connect_catalog(&cfg.database_url, migrate).await?);

    match mode {
        // --- Handle migration mode ---
        Mode::Migrate => {
            let applied = run_migrations(&db).await?;
            tracing::info!("Database migration complete ({} statements).", applied);
            Ok(())
        }
        Mode::Serve => serve(&cfg, catalog_profiler(&cfg, db)).await,
        Mode::Profile(request) => run_profile(&cfg, catalog_profiler(&cfg, db), request).await,
    }
}

fn catalog_profiler(cfg: &AppConfig, db: Arc<sqlx::SqlitePool>) -> Profiler<CatalogSource> {
    Profiler::new(CatalogSource::new(db), cfg.output_dir.clone()).with_limit(cfg.limit)
}

/// Open the catalog pool. Only migration mode may create a missing database.
async fn connect_catalog(db_url: &str, create: bool) -> Result<sqlx::SqlitePool> {
    tracing::debug!("Connecting using raw URL => {}", db_url);

    if create {
        // Extract the local file path SQLx will use
        let db_path = db_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:")
            .trim_start_matches("file:");
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                tracing::info!("Created missing directory {:?}", parent);
            }
        }
    }

    let options = SqliteConnectOptions::from_str(db_url)
        .with_context(|| format!("parsing database URL `{}`", db_url))?
        .create_if_missing(create);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("opening catalog `{}`", db_url))
}

/// Serve bucket profiles over HTTP until the process is stopped.
async fn serve(cfg: &AppConfig, profiler: Profiler<CatalogSource>) -> Result<()> {
    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(profiler);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

/// Profile the requested buckets and write their reports.
async fn run_profile(
    cfg: &AppConfig,
    profiler: Profiler<CatalogSource>,
    request: ProfileRequest,
) -> Result<()> {
    // --- Determine which buckets to profile ---
    let buckets = if !request.buckets.is_empty() {
        request.buckets
    } else {
        println!("Listing all catalog buckets...");
        let all = profiler
            .list_buckets()
            .await
            .context("failed to list buckets")?;
        println!("Found {} bucket(s)", all.len());

        if !request.all && !request.assume_yes && !all.is_empty() {
            for bucket in &all {
                println!("  - {}", bucket);
            }
            if !confirm("\nDo you want to profile all these buckets? (yes/no): ")? {
                println!("Profiling cancelled.");
                return Ok(());
            }
        }
        all
    };

    if buckets.is_empty() {
        println!("No buckets to profile.");
        return Ok(());
    }

    std::fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("failed to create output directory `{}`", cfg.output_dir))?;

    // --- Cancel in-flight listings on Ctrl-C ---
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; cancelling remaining listings");
            on_signal.cancel();
        }
    });

    if let [bucket] = buckets.as_slice() {
        println!("{}", format::format_header(&format!("Profiling bucket: {bucket}")));
        let written = profiler.profile_bucket(bucket, &cancel).await?;
        println!("Reports written:");
        for path in written {
            println!("  - {}", path.display());
        }
        return Ok(());
    }

    let outcome = profiler
        .profile_many(buckets, cfg.concurrency, &cancel)
        .await;

    println!("\n{}", format::format_header("Summary"));
    println!("Total buckets: {}", outcome.total);
    println!("Successfully profiled: {}", outcome.succeeded);
    println!("Failed: {}", outcome.failed.len());
    if !outcome.failed.is_empty() {
        println!("\nFailed buckets:");
        for (bucket, cause) in &outcome.failed {
            println!("  - {}: {}", bucket, cause);
        }
    }

    Ok(())
}

/// Ask a yes/no question on stdin.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin()
        .lock()
        .read_line(&mut response)
        .context("failed to read input")?;

    Ok(matches!(
        response.trim().to_lowercase().as_str(),
        "yes" | "y"
    ))
}
