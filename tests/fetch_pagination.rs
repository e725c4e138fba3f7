// tests/fetch_pagination.rs
mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use futures::StreamExt;
use news_monitor::ingest::fetcher::PaginatedFetcher;
use news_monitor::ingest::types::SearchProvider;

use common::{batch, MockProvider};

fn now() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

async fn collect(fetcher: &PaginatedFetcher, term: &str) -> Vec<news_monitor::Article> {
    fetcher.stream_at(term, now()).collect().await
}

#[tokio::test]
async fn zero_results_make_one_request_and_no_articles() {
    let mock = Arc::new(MockProvider::new().page("dna", 1, 0, vec![]));
    let provider: Arc<dyn SearchProvider> = mock.clone();
    let fetcher = PaginatedFetcher::new(provider, 1, "en");

    assert!(collect(&fetcher, "dna").await.is_empty());
    assert_eq!(mock.pages_requested("dna"), vec![1]);
}

#[tokio::test]
async fn walks_every_page_in_order_and_tags_term() {
    let mock = Arc::new(
        MockProvider::new()
            .page("dna", 1, 250, batch("p1", 100))
            .page("dna", 2, 250, batch("p2", 100))
            .page("dna", 3, 250, batch("p3", 50)),
    );
    let provider: Arc<dyn SearchProvider> = mock.clone();
    let fetcher = PaginatedFetcher::new(provider, 1, "en");

    let got = collect(&fetcher, "dna").await;
    assert_eq!(got.len(), 250);
    assert!(got.iter().all(|a| a.search_term == "dna"));
    assert_eq!(got[0].title, "p1 0");
    assert_eq!(got[249].title, "p3 49");
    assert_eq!(mock.pages_requested("dna"), vec![1, 2, 3]);
}

#[tokio::test]
async fn exactly_one_page_needs_no_follow_up() {
    let mock = Arc::new(MockProvider::new().page("dna", 1, 100, batch("p1", 100)));
    let provider: Arc<dyn SearchProvider> = mock.clone();
    let fetcher = PaginatedFetcher::new(provider, 1, "en");

    assert_eq!(collect(&fetcher, "dna").await.len(), 100);
    assert_eq!(mock.pages_requested("dna"), vec![1]);
}

#[tokio::test]
async fn first_page_failure_is_isolated_to_the_term() {
    let mock = Arc::new(MockProvider::new().fail("dna", 1));
    let provider: Arc<dyn SearchProvider> = mock.clone();
    let fetcher = PaginatedFetcher::new(provider, 1, "en");

    assert!(collect(&fetcher, "dna").await.is_empty());
    assert_eq!(mock.pages_requested("dna"), vec![1]);
}

#[tokio::test]
async fn later_page_failure_keeps_earlier_pages_and_stops() {
    let mock = Arc::new(
        MockProvider::new()
            .page("dna", 1, 300, batch("p1", 100))
            .fail("dna", 2)
            .page("dna", 3, 300, batch("p3", 100)),
    );
    let provider: Arc<dyn SearchProvider> = mock.clone();
    let fetcher = PaginatedFetcher::new(provider, 1, "en");

    let got = collect(&fetcher, "dna").await;
    assert_eq!(got.len(), 100);
    assert_eq!(mock.pages_requested("dna"), vec![1, 2]);
}

#[tokio::test]
async fn stream_is_lazy_until_polled() {
    let mock = Arc::new(
        MockProvider::new()
            .page("dna", 1, 200, batch("p1", 100))
            .page("dna", 2, 200, batch("p2", 100)),
    );
    let provider: Arc<dyn SearchProvider> = mock.clone();
    let fetcher = PaginatedFetcher::new(provider, 1, "en");

    let stream = fetcher.stream_at("dna", now());
    assert!(mock.pages_requested("dna").is_empty());

    let first: Vec<_> = stream.take(3).collect().await;
    assert_eq!(first.len(), 3);
    assert_eq!(mock.pages_requested("dna"), vec![1]);
}

#[tokio::test]
async fn window_and_language_reach_the_provider() {
    let mock = Arc::new(MockProvider::new().page("dna", 1, 1, batch("p1", 1)));
    let provider: Arc<dyn SearchProvider> = mock.clone();
    let fetcher = PaginatedFetcher::new(provider, 6, "br");

    collect(&fetcher, "dna").await;
    let calls = mock.calls.lock().unwrap();
    let q = &calls[0];
    assert_eq!(q.language, "br");
    assert!(q.params().contains(&("language", "pt".to_string())));
    assert_eq!(q.to, now());
    assert_eq!(q.to - q.from, chrono::Duration::hours(6));
    assert_eq!(q.page_size, 100);
}

#[tokio::test]
async fn out_of_range_window_skips_the_provider() {
    let mock = Arc::new(MockProvider::new().page("dna", 1, 1, batch("p1", 1)));
    let provider: Arc<dyn SearchProvider> = mock.clone();

    for hours in [-5, 0, 9_000_000_000_000_000] {
        let fetcher = PaginatedFetcher::new(provider.clone(), hours, "en");
        assert!(collect(&fetcher, "dna").await.is_empty());
    }
    assert!(mock.pages_requested("dna").is_empty());
}
