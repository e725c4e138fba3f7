//! On-demand retrieval for the `/search` endpoint: fetch every page for the
//! requested keywords and return the distinct articles. Nothing is persisted.

use std::collections::HashSet;
use std::pin::pin;
use std::sync::Arc;

use futures::StreamExt;

use crate::error::{NewsError, ACCEPTED_LANGUAGES};
use crate::ingest::fetcher::{validate_since_hours, PaginatedFetcher};
use crate::ingest::terms::compile_terms;
use crate::ingest::types::SearchProvider;
use crate::models::Article;

/// Accept `en`/`br` (case-insensitive). A missing language is rejected.
pub fn validate_language(language: Option<&str>) -> Result<String, NewsError> {
    let lang = language
        .map(|l| l.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if ACCEPTED_LANGUAGES.contains(&lang.as_str()) {
        Ok(lang)
    } else {
        Err(NewsError::UnsupportedLanguage(lang))
    }
}

/// Distinct articles (by identity key, first-seen order) or `None` when the
/// search found nothing.
pub async fn retrieve_news(
    provider: Arc<dyn SearchProvider>,
    keywords: &[String],
    since_hours: i64,
    language: Option<&str>,
) -> Result<Option<Vec<Article>>, NewsError> {
    let language = validate_language(language)?;
    let since_hours = validate_since_hours(since_hours)?;
    let fetcher = PaginatedFetcher::new(provider, since_hours, language);

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for term in compile_terms(keywords) {
        let mut articles = pin!(fetcher.stream(&term));
        while let Some(article) = articles.next().await {
            if seen.insert(article.identity_key()) {
                out.push(article);
            }
        }
    }

    tracing::info!(target: "api", keywords = keywords.len(), found = out.len(), "retrieval finished");
    Ok(if out.is_empty() { None } else { Some(out) })
}
