//! # Scheduler
//! Recurring-job gate: `idle → checking → {running | waiting} → idle`.
//!
//! `checking` reads the newest monitoring entry of the job's service. If less
//! than `min_interval` has elapsed the scheduler sleeps for the remainder and
//! returns to idle without running the body; the next tick checks again.
//! Otherwise the body runs to completion and appends its monitoring entry.
//! One scheduler per service per store is assumed.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use metrics::counter;

use crate::aggregate::{run_aggregation, Aggregator};
use crate::ingest::IngestionEngine;
use crate::models::{MonitoringRecord, Service};
use crate::store::SharedStore;

pub const INGESTION_INTERVAL: Duration = Duration::from_secs(3600);
pub const AGGREGATION_INTERVAL: Duration = Duration::from_secs(86_400);

/// Last-run time assumed when a service has never run.
pub fn never_run() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 12, 31, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Run,
    /// Remaining time until the interval elapses, whole seconds.
    Wait(Duration),
}

/// Pure gate decision.
pub fn decide(last_run: DateTime<Utc>, now: DateTime<Utc>, min_interval: Duration) -> Gate {
    let elapsed = now.signed_duration_since(last_run);
    let min = chrono::Duration::from_std(min_interval).unwrap_or(chrono::Duration::MAX);
    if elapsed >= min {
        return Gate::Run;
    }
    // A last run stamped in the future never waits longer than one interval.
    let remaining = (min - elapsed).min(min);
    let millis = remaining.num_milliseconds().max(0) as u64;
    Gate::Wait(Duration::from_secs(millis.div_ceil(1000)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Ran(MonitoringRecord),
    Waited(Duration),
}

/// A recurring job body.
#[async_trait]
pub trait Job: Send + Sync {
    fn service(&self) -> Service;
    fn min_interval(&self) -> Duration;
    /// Run to completion and append the service's monitoring entry.
    async fn run(&self) -> Result<MonitoringRecord>;
}

pub struct Scheduler<J: Job> {
    job: J,
    store: SharedStore,
}

impl<J: Job> Scheduler<J> {
    pub fn new(job: J, store: SharedStore) -> Self {
        Self { job, store }
    }

    pub fn job(&self) -> &J {
        &self.job
    }

    /// `checking` state: gate decision against the monitoring log.
    pub async fn gate(&self, now: DateTime<Utc>) -> Result<Gate> {
        let service = self.job.service();
        let last = self
            .store
            .latest_monitoring(service)
            .await
            .with_context(|| format!("reading last {service} run"))?
            .map(|r| r.entry_dt)
            .unwrap_or_else(never_run);
        Ok(decide(last, now, self.job.min_interval()))
    }

    /// One full cycle starting from `idle`.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let service = self.job.service();
        match self.gate(Utc::now()).await? {
            Gate::Wait(remaining) => {
                tracing::info!(
                    target: "scheduler",
                    %service,
                    wait_secs = remaining.as_secs(),
                    "interval not elapsed since last run, waiting"
                );
                counter!("scheduler_waits_total", "service" => service.as_str()).increment(1);
                tokio::time::sleep(remaining).await;
                Ok(TickOutcome::Waited(remaining))
            }
            Gate::Run => {
                tracing::info!(target: "scheduler", %service, "running job");
                let record = self.job.run().await?;
                tracing::info!(
                    target: "scheduler",
                    %service,
                    total_added = ?record.total_added,
                    next_in_secs = self.job.min_interval().as_secs(),
                    "run finished and registered"
                );
                Ok(TickOutcome::Ran(record))
            }
        }
    }

    /// Loop forever. A failed run is not retried until one interval later.
    pub async fn run_forever(&self) {
        loop {
            if let Err(e) = self.tick().await {
                let service = self.job.service();
                tracing::error!(target: "scheduler", %service, error = ?e, "run failed");
                counter!("scheduler_failures_total", "service" => service.as_str()).increment(1);
                tokio::time::sleep(self.job.min_interval()).await;
            }
        }
    }
}

/// Hourly ingestion over a fixed keyword list.
pub struct IngestionJob {
    engine: IngestionEngine,
    terms: Vec<String>,
    interval: Duration,
}

impl IngestionJob {
    pub fn new(engine: IngestionEngine, terms: Vec<String>) -> Self {
        Self {
            engine,
            terms,
            interval: INGESTION_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait]
impl Job for IngestionJob {
    fn service(&self) -> Service {
        Service::Ingestion
    }

    fn min_interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> Result<MonitoringRecord> {
        let (_summary, record) = self.engine.run(&self.terms).await?;
        Ok(record)
    }
}

/// Daily full-corpus aggregation.
pub struct AggregationJob {
    aggregator: Box<dyn Aggregator>,
    store: SharedStore,
    interval: Duration,
}

impl AggregationJob {
    pub fn new(aggregator: Box<dyn Aggregator>, store: SharedStore) -> Self {
        Self {
            aggregator,
            store,
            interval: AGGREGATION_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait]
impl Job for AggregationJob {
    fn service(&self) -> Service {
        Service::Aggregation
    }

    fn min_interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> Result<MonitoringRecord> {
        let (_report, record) = run_aggregation(self.aggregator.as_ref(), &self.store).await?;
        Ok(record)
    }
}
