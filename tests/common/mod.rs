// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use news_monitor::ingest::types::{RawArticle, RawSource, SearchPage, SearchProvider, SearchQuery};

/// Scripted provider: answers per (term, page), records every request.
#[derive(Default)]
pub struct MockProvider {
    pages: HashMap<(String, u32), Result<SearchPage, String>>,
    pub calls: Mutex<Vec<SearchQuery>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, term: &str, page: u32, total_results: u64, articles: Vec<RawArticle>) -> Self {
        self.pages.insert(
            (term.to_string(), page),
            Ok(SearchPage {
                total_results,
                articles,
            }),
        );
        self
    }

    pub fn fail(mut self, term: &str, page: u32) -> Self {
        self.pages
            .insert((term.to_string(), page), Err(format!("HTTP 500 for {term} page {page}")));
        self
    }

    pub fn into_arc(self) -> Arc<dyn SearchProvider> {
        Arc::new(self)
    }

    pub fn pages_requested(&self, term: &str) -> Vec<u32> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.term == term)
            .map(|q| q.page)
            .collect()
    }
}

#[async_trait::async_trait]
impl SearchProvider for MockProvider {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        self.calls.lock().unwrap().push(query.clone());
        match self.pages.get(&(query.term.clone(), query.page)) {
            Some(Ok(p)) => Ok(p.clone()),
            Some(Err(msg)) => Err(anyhow!(msg.clone())),
            None => Ok(SearchPage::default()),
        }
    }

    fn name(&self) -> &'static str {
        "Mock"
    }
}

pub fn raw(source: Option<&str>, title: &str, published_at: &str) -> RawArticle {
    RawArticle {
        source: RawSource {
            id: None,
            name: source.map(str::to_string),
        },
        author: None,
        title: Some(title.to_string()),
        description: None,
        url: Some(format!("https://example.com/{}", title.replace(' ', "-"))),
        url_to_image: None,
        published_at: published_at.to_string(),
        content: None,
    }
}

/// `n` distinct articles for one page.
pub fn batch(prefix: &str, n: usize) -> Vec<RawArticle> {
    (0..n)
        .map(|i| raw(Some("Wire"), &format!("{prefix} {i}"), "2024-03-01T08:00:00Z"))
        .collect()
}
