use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Can only succeed once per process.
    pub fn install() -> Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("aggregate_runs_total", "Completed aggregation runs.");
        describe_gauge!("aggregate_last_run_ts", "Unix ts when aggregation last completed.");
        describe_counter!("scheduler_waits_total", "Gate checks that ended in a wait.");
        describe_counter!("scheduler_failures_total", "Job runs that returned an error.");
        describe_counter!("newsapi_http_errors_total", "Failed provider requests.");

        Ok(Self { handle })
    }
}
