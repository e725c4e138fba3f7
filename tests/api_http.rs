// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /search (contract: 400s, status text, dedup of results)
// - GET /debug/last-run, /debug/last-report
// - GET /metrics without a recorder

mod common;

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::Request,
    Router,
};
use http::StatusCode;
use serde_json::json;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use news_monitor::api::{
    self, AppState, EMPTY_KEYWORDS_MSG, INVALID_LANGUAGE_MSG, INVALID_RANGE_MSG,
};
use news_monitor::models::MonitoringRecord;
use news_monitor::store::{DocumentStore, MemoryStore, SharedStore};

use common::{batch, raw, MockProvider};

const BODY_LIMIT: usize = 1024 * 1024;

fn app_with(mock: MockProvider, store: SharedStore) -> Router {
    api::router(AppState::new(mock.into_arc(), store))
}

fn test_router(mock: MockProvider) -> Router {
    app_with(mock, Arc::new(MemoryStore::new()))
}

fn post_search(payload: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/search")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST /search")
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    String::from_utf8(bytes).expect("utf8")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let resp = test_router(MockProvider::new()).oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await.trim(), "OK");
}

#[tokio::test]
async fn search_without_keywords_is_400() {
    let resp = test_router(MockProvider::new())
        .oneshot(post_search(json!({ "since_hours": 2 })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, EMPTY_KEYWORDS_MSG);
}

#[tokio::test]
async fn search_with_unsupported_language_is_400() {
    let resp = test_router(MockProvider::new())
        .oneshot(post_search(json!({ "keywords": ["dna"], "language": "de" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, INVALID_LANGUAGE_MSG);
}

#[tokio::test]
async fn search_without_language_is_400() {
    let mock = Arc::new(MockProvider::new().page("dna", 1, 1, batch("d", 1)));
    let resp = api::router(AppState::new(mock.clone(), Arc::new(MemoryStore::new())))
        .oneshot(post_search(json!({ "keywords": ["dna"] })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, INVALID_LANGUAGE_MSG);
    assert!(mock.pages_requested("dna").is_empty());
}

#[tokio::test]
async fn search_with_out_of_range_window_is_400() {
    for hours in [json!(9_000_000_000_000_000_i64), json!(-5), json!(0)] {
        let mock = Arc::new(MockProvider::new());
        let resp = api::router(AppState::new(mock.clone(), Arc::new(MemoryStore::new())))
            .oneshot(post_search(
                json!({ "keywords": ["dna"], "since_hours": hours, "language": "en" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "since_hours={hours}");
        assert_eq!(body_text(resp).await, INVALID_RANGE_MSG);
        assert!(mock.calls.lock().unwrap().is_empty());
    }
}

#[tokio::test]
async fn portuguese_search_queries_provider_in_pt() {
    let mock = Arc::new(MockProvider::new().page("dna", 1, 1, batch("d", 1)));
    let resp = api::router(AppState::new(mock.clone(), Arc::new(MemoryStore::new())))
        .oneshot(post_search(json!({ "keywords": ["dna"], "language": "BR" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let calls = mock.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].params().contains(&("language", "pt".to_string())));
}

#[tokio::test]
async fn search_returns_distinct_articles_and_summary() {
    let story = raw(Some("BBC"), "X", "2024-01-01T00:00:00");
    let mut page = batch("d", 2);
    page.push(story.clone());
    page.push(story);
    let mock = MockProvider::new().page("dna", 1, 4, page);

    let resp = test_router(mock)
        .oneshot(post_search(json!({ "keywords": ["DNA"], "since_hours": 3, "language": "br" })))
        .await
        .unwrap();
    assert!(resp.status().is_success(), "got {}", resp.status());

    let v: Json = serde_json::from_str(&body_text(resp).await).expect("json");
    assert_eq!(
        v["status"],
        "A total of 3 articles were found. Search Range: NOW-3h."
    );
    assert_eq!(v["keywords"], json!(["DNA"]));
    let results = v["search_result"].as_array().expect("array");
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["search_term"], "dna");
}

#[tokio::test]
async fn search_with_no_hits_reports_no_results() {
    let resp = test_router(MockProvider::new().page("dna", 1, 0, vec![]))
        .oneshot(post_search(json!({ "keywords": ["dna"], "language": "en" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v: Json = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(v["status"], "No results found. Search Range: NOW-1h.");
    assert!(v["search_result"].is_null());
}

#[tokio::test]
async fn search_survives_provider_failure() {
    let resp = test_router(MockProvider::new().fail("dna", 1))
        .oneshot(post_search(json!({ "keywords": ["dna"], "language": "en" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn debug_last_run_reads_monitoring_log() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    store
        .insert_monitoring(&MonitoringRecord::ingestion(vec!["dna".into()], 4))
        .await
        .unwrap();

    let req = Request::builder()
        .uri("/debug/last-run?service=ingestion")
        .body(Body::empty())
        .unwrap();
    let resp = app_with(MockProvider::new(), store.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v: Json = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(v["service"], "ingestion");
    assert_eq!(v["total_added"], 4);

    let bad = Request::builder()
        .uri("/debug/last-run?service=transformer")
        .body(Body::empty())
        .unwrap();
    let resp = app_with(MockProvider::new(), store.clone()).oneshot(bad).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let report = Request::builder()
        .uri("/debug/last-report")
        .body(Body::empty())
        .unwrap();
    let resp = app_with(MockProvider::new(), store).oneshot(report).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "null");
}

#[tokio::test]
async fn metrics_without_recorder_is_404() {
    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = test_router(MockProvider::new()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
