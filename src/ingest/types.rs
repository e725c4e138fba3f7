// src/ingest/types.rs
use anyhow::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::Article;

/// Results per provider page.
pub const PAGE_SIZE: u32 = 100;

/// Provider timestamps: second precision, no offset.
pub const QUERY_TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// NewsAPI language code for an accepted request language (`br` is Portuguese).
pub fn provider_language(language: &str) -> &str {
    match language {
        "br" => "pt",
        other => other,
    }
}

/// One page request against the search provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub language: String,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
}

impl SearchQuery {
    /// Query parameters in provider order; `page` is omitted for page 1.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut p = vec![
            ("q", self.term.clone()),
            ("from", self.from.format(QUERY_TS_FORMAT).to_string()),
            ("to", self.to.format(QUERY_TS_FORMAT).to_string()),
            ("language", provider_language(&self.language).to_string()),
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if self.page > 1 {
            p.push(("page", self.page.to_string()));
        }
        p
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Article as the provider returns it, before it is tagged with a term.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawArticle {
    #[serde(default)]
    pub source: RawSource,
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "urlToImage")]
    pub url_to_image: Option<String>,
    #[serde(rename = "publishedAt", default)]
    pub published_at: String,
    pub content: Option<String>,
}

impl RawArticle {
    pub fn tag(self, search_term: &str) -> Article {
        Article {
            source_id: self.source.id,
            source_name: self.source.name,
            author: self.author,
            title: self.title.unwrap_or_default(),
            description: self.description,
            url: self.url,
            url_to_image: self.url_to_image,
            published_at: self.published_at,
            content: self.content,
            search_term: search_term.to_string(),
            entry_dt: None,
        }
    }
}

/// `{totalResults, articles}` payload of one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchPage {
    #[serde(rename = "totalResults", default)]
    pub total_results: u64,
    #[serde(default)]
    pub articles: Vec<RawArticle>,
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Fetch one page. Non-success statuses come back as errors.
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage>;
    fn name(&self) -> &'static str;
}
