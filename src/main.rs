//! News Monitor: HTTP entrypoint
//! Boots the Axum server (`/search`, `/health`, `/metrics`) and spawns the
//! hourly ingestion and daily aggregation schedulers against the same store.

use news_monitor::api::{self, AppState};
use news_monitor::bootstrap::{init_tracing, NewsRuntime};
use news_monitor::config::Settings;
use news_monitor::metrics::Metrics;
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env()?;
    let runtime = NewsRuntime::from_settings(settings).await?;

    // Both loops live as long as the process; the handles are not awaited.
    let _schedulers = runtime.spawn_schedulers();

    let mut state = AppState::new(runtime.provider.clone(), runtime.store.clone());
    match Metrics::install() {
        Ok(m) => state = state.with_metrics(m.handle),
        Err(e) => tracing::warn!(error = ?e, "metrics recorder not installed"),
    }

    Ok(api::router(state).into())
}
