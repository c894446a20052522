use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr};

use crate::services::profiler::DEFAULT_CONCURRENCY;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub output_dir: String,
    pub limit: u64,
    pub concurrency: usize,
    pub host: String,
    pub port: u16,
}

/// What to do once configuration is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Apply the catalog schema and exit.
    Migrate,
    /// Serve profiles over HTTP.
    Serve,
    /// Profile buckets from the command line.
    Profile(ProfileRequest),
}

/// Which buckets to profile and how.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRequest {
    pub buckets: Vec<String>,
    pub all: bool,
    pub assume_yes: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Profile object store buckets: storage classes, file types and partitions",
    long_about = "Analyzes the buckets of an S3-compatible object store catalog and writes \
three reports per bucket:\n  \
<bucket>-summary.txt     bucket statistics and storage class breakdown\n  \
<bucket>-metadata.txt    file type, size and date distribution\n  \
<bucket>-partitions.txt  detected partition layout"
)]
pub struct Args {
    /// Comma-separated list of bucket names to profile
    #[arg(short, long, value_delimiter = ',')]
    pub buckets: Vec<String>,

    /// Profile all buckets in the catalog
    #[arg(short, long)]
    pub all: bool,

    /// Do not ask for confirmation before profiling every bucket
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Maximum objects to scan per bucket, 0 = unlimited (overrides BUCKET_PROFILER_LIMIT)
    #[arg(short, long)]
    pub limit: Option<u64>,

    /// Directory for report files (overrides BUCKET_PROFILER_OUTPUT_DIR)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Buckets profiled at once (overrides BUCKET_PROFILER_CONCURRENCY)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Catalog database URL (overrides BUCKET_PROFILER_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Host to bind to in serve mode (overrides BUCKET_PROFILER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to in serve mode (overrides BUCKET_PROFILER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Run catalog migrations and exit
    #[arg(long)]
    pub migrate: bool,

    /// Serve profiles over HTTP instead of writing report files
    #[arg(long, conflicts_with = "migrate")]
    pub serve: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the run mode.
    pub fn from_env_and_args() -> Result<(Self, Mode)> {
        Self::from_args(Args::parse(), |name| env::var(name))
    }

    /// Merge parsed args over variables read through `lookup`.
    pub fn from_args<F>(args: Args, lookup: F) -> Result<(Self, Mode)>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        // --- Environment fallback ---
        let env_db = lookup("BUCKET_PROFILER_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/object_store.db".into());
        let env_output = lookup("BUCKET_PROFILER_OUTPUT_DIR").unwrap_or_else(|_| ".".into());
        let env_host = lookup("BUCKET_PROFILER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_limit = parse_var(&lookup, "BUCKET_PROFILER_LIMIT", 0u64)?;
        let env_concurrency =
            parse_var(&lookup, "BUCKET_PROFILER_CONCURRENCY", DEFAULT_CONCURRENCY)?;
        let env_port = parse_var(&lookup, "BUCKET_PROFILER_PORT", 3000u16)?;

        // --- Merge ---
        let cfg = Self {
            database_url: args.database_url.unwrap_or(env_db),
            output_dir: args.output_dir.unwrap_or(env_output),
            limit: args.limit.unwrap_or(env_limit),
            concurrency: args.concurrency.unwrap_or(env_concurrency).max(1),
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
        };

        let mode = if args.migrate {
            Mode::Migrate
        } else if args.serve {
            Mode::Serve
        } else {
            Mode::Profile(ProfileRequest {
                buckets: args
                    .buckets
                    .iter()
                    .map(|b| b.trim().to_string())
                    .filter(|b| !b.is_empty())
                    .collect(),
                all: args.all,
                assume_yes: args.yes,
            })
        };

        Ok((cfg, mode))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match lookup(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}
