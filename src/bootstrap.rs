// src/bootstrap.rs
//! Process wiring shared by the HTTP server and the worker binary.

use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::aggregate::FullScanAggregator;
use crate::config::Settings;
use crate::ingest::config::load_terms_default;
use crate::ingest::fetcher::PaginatedFetcher;
use crate::ingest::providers::NewsApiProvider;
use crate::ingest::types::SearchProvider;
use crate::ingest::IngestionEngine;
use crate::scheduler::{AggregationJob, IngestionJob, Scheduler};
use crate::store::{self, SharedStore};

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines;
/// the filter comes from `RUST_LOG` (default `info`). Safe to call twice.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

pub struct NewsRuntime {
    pub settings: Settings,
    pub store: SharedStore,
    pub provider: Arc<dyn SearchProvider>,
    pub terms: Vec<String>,
}

impl NewsRuntime {
    /// Connect the store, build the provider client and load monitored keywords.
    /// Any failure here is a configuration error and should stop the process.
    pub async fn from_settings(settings: Settings) -> Result<Self> {
        let store = store::connect(&settings.database_url).await?;
        let provider: Arc<dyn SearchProvider> = Arc::new(NewsApiProvider::new(
            settings.api_endpoint.clone(),
            settings.api_key.clone(),
            settings.request_timeout,
        )?);
        let terms = load_terms_default()?;
        // Safe diagnostics: never log the key itself
        info!(
            target: "bootstrap",
            endpoint = %settings.api_endpoint,
            key_len = settings.api_key.len(),
            terms = ?terms,
            database = %settings.database_url,
            "news runtime configured"
        );
        Ok(Self {
            settings,
            store,
            provider,
            terms,
        })
    }

    pub fn ingestion_scheduler(&self) -> Scheduler<IngestionJob> {
        let fetcher = PaginatedFetcher::new(
            self.provider.clone(),
            self.settings.since_hours,
            self.settings.language.clone(),
        );
        let engine = IngestionEngine::new(fetcher, self.store.clone());
        let job = IngestionJob::new(engine, self.terms.clone()).with_interval(self.settings.ingest_interval);
        Scheduler::new(job, self.store.clone())
    }

    pub fn aggregation_scheduler(&self) -> Scheduler<AggregationJob> {
        let job = AggregationJob::new(Box::new(FullScanAggregator), self.store.clone())
            .with_interval(self.settings.aggregate_interval);
        Scheduler::new(job, self.store.clone())
    }

    /// Spawn both scheduler loops; they never return.
    pub fn spawn_schedulers(&self) -> (JoinHandle<()>, JoinHandle<()>) {
        let ingest = self.ingestion_scheduler();
        let aggregate = self.aggregation_scheduler();
        (
            tokio::spawn(async move { ingest.run_forever().await }),
            tokio::spawn(async move { aggregate.run_forever().await }),
        )
    }
}
