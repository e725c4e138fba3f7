//! Runs a single scheduler loop without the HTTP server.
//!
//! ```text
//! news-worker ingestion     # hourly ingestion
//! news-worker aggregation   # daily aggregation
//! news-worker ingestion --once
//! ```

use anyhow::Result;
use news_monitor::bootstrap::{init_tracing, NewsRuntime};
use news_monitor::config::Settings;
use news_monitor::scheduler::Job;
use news_monitor::Service;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let service: Service = args.get(1).map(String::as_str).unwrap_or("ingestion").parse()?;
    // --once runs the job body immediately and exits, bypassing the gate.
    let once = args.iter().any(|a| a == "--once");

    let runtime = NewsRuntime::from_settings(Settings::from_env()?).await?;

    match (service, once) {
        (Service::Ingestion, true) => {
            let record = runtime.ingestion_scheduler().job().run().await?;
            println!("ingestion added {} articles", record.total_added.unwrap_or(0));
        }
        (Service::Aggregation, true) => {
            runtime.aggregation_scheduler().job().run().await?;
            println!("aggregation report written");
        }
        (Service::Ingestion, false) => runtime.ingestion_scheduler().run_forever().await,
        (Service::Aggregation, false) => runtime.aggregation_scheduler().run_forever().await,
    }
    Ok(())
}
