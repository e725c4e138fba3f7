use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;

use crate::error::NewsError;
use crate::ingest::types::SearchProvider;
use crate::models::{AggregateReport, Article, MonitoringRecord, Service};
use crate::retrieve::retrieve_news;
use crate::store::SharedStore;

pub const EMPTY_KEYWORDS_MSG: &str = "Invalid Request - Empty Keywords Data.";
pub const INVALID_LANGUAGE_MSG: &str = "Invalid Request - Empty or Invalid Language Data.";
pub const INVALID_RANGE_MSG: &str = "Invalid Request - Invalid Search Range.";

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn SearchProvider>,
    pub store: SharedStore,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(provider: Arc<dyn SearchProvider>, store: SharedStore) -> Self {
        Self {
            provider,
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/search", post(search))
        .route("/metrics", get(render_metrics))
        .route("/debug/last-report", get(debug_last_report))
        .route("/debug/last-run", get(debug_last_run))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, serde::Deserialize)]
pub struct SearchReq {
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default = "default_since_hours")]
    pub since_hours: i64,
    #[serde(default)]
    pub language: Option<String>,
}

fn default_since_hours() -> i64 {
    1
}

#[derive(Debug, serde::Serialize)]
pub struct SearchResp {
    pub status: String,
    pub keywords: Vec<String>,
    pub search_result: Option<Vec<Article>>,
}

async fn search(State(state): State<AppState>, Json(body): Json<SearchReq>) -> Response {
    let Some(keywords) = body.keywords else {
        return (StatusCode::BAD_REQUEST, EMPTY_KEYWORDS_MSG).into_response();
    };

    let result = match retrieve_news(
        state.provider.clone(),
        &keywords,
        body.since_hours,
        body.language.as_deref(),
    )
    .await
    {
        Ok(r) => r,
        Err(e) if e.is_validation() => {
            tracing::info!(target: "api", error = %e, "rejected search request");
            let msg = match e {
                NewsError::InvalidSearchRange(_) => INVALID_RANGE_MSG,
                _ => INVALID_LANGUAGE_MSG,
            };
            return (StatusCode::BAD_REQUEST, msg).into_response();
        }
        Err(e) => {
            tracing::error!(target: "api", error = ?e, "search failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let status = match &result {
        None => format!("No results found. Search Range: NOW-{}h.", body.since_hours),
        Some(list) => format!(
            "A total of {} articles were found. Search Range: NOW-{}h.",
            list.len(),
            body.since_hours
        ),
    };

    Json(SearchResp {
        status,
        keywords,
        search_result: result,
    })
    .into_response()
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(h) => h.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

async fn debug_last_report(State(state): State<AppState>) -> Response {
    match state.store.latest_report().await {
        Ok(r) => Json::<Option<AggregateReport>>(r).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn debug_last_run(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let raw = q.get("service").map(String::as_str).unwrap_or("ingestion");
    let service: Service = match raw.parse() {
        Ok(s) => s,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("{e}")).into_response(),
    };
    match state.store.latest_monitoring(service).await {
        Ok(r) => Json::<Option<MonitoringRecord>>(r).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
