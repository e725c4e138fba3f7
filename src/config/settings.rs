// src/config/settings.rs
use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::NewsError;
use crate::ingest::fetcher::validate_since_hours;
use crate::ingest::providers::newsapi::DEFAULT_ENDPOINT;
use crate::retrieve::validate_language;

fn default_timeout_secs() -> u64 {
    30
}
fn default_since_hours() -> i64 {
    1
}
fn default_ingest_interval_secs() -> u64 {
    3600
}
fn default_aggregate_interval_secs() -> u64 {
    86_400
}
fn default_database_url() -> String {
    "sqlite://news.db".to_string()
}

/// Runtime settings resolved from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub api_endpoint: String,
    /// Per-request timeout towards the search provider.
    pub request_timeout: Duration,
    pub language: String,
    pub since_hours: i64,
    pub ingest_interval: Duration,
    pub aggregate_interval: Duration,
    /// `memory://` or a sqlx SQLite URL.
    pub database_url: String,
}

impl Settings {
    /// Missing `NEWS_API_KEY` is fatal: nothing can be fetched without it.
    /// An out-of-range window or unsupported language is rejected here too.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("NEWS_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(NewsError::MissingConfig("NEWS_API_KEY"))?;
        let language = validate_language(Some(
            env::var("NEWS_LANGUAGE").as_deref().unwrap_or("en"),
        ))
        .context("invalid value for NEWS_LANGUAGE")?;
        let since_hours = validate_since_hours(parse_env("NEWS_SINCE_HOURS", default_since_hours())?)
            .context("invalid value for NEWS_SINCE_HOURS")?;

        Ok(Self {
            api_key,
            api_endpoint: env::var("NEWS_API_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            request_timeout: Duration::from_secs(parse_env("NEWS_API_TIMEOUT_SECS", default_timeout_secs())?),
            language,
            since_hours,
            ingest_interval: Duration::from_secs(parse_env(
                "INGEST_INTERVAL_SECS",
                default_ingest_interval_secs(),
            )?),
            aggregate_interval: Duration::from_secs(parse_env(
                "AGGREGATE_INTERVAL_SECS",
                default_aggregate_interval_secs(),
            )?),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| default_database_url()),
        })
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {name}: {v}")),
        _ => Ok(default),
    }
}
