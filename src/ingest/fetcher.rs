// src/ingest/fetcher.rs
//! Drives one compiled term across every result page of the provider.
//!
//! Pages are requested strictly in order, one at a time, and only while the
//! consumer keeps polling. A failed first page yields nothing for the term; a
//! failed later page ends the term but keeps what earlier pages produced.

use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta, Utc};
use futures::stream::{self, Stream, StreamExt};
use metrics::counter;

use crate::error::{NewsError, MAX_SINCE_HOURS};
use crate::ingest::types::{SearchProvider, SearchQuery, PAGE_SIZE};
use crate::models::Article;

/// `ceil(total_results / PAGE_SIZE)`.
pub fn total_pages(total_results: u64) -> u32 {
    let pages = total_results.div_ceil(u64::from(PAGE_SIZE));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Accept `1..=MAX_SINCE_HOURS`.
pub fn validate_since_hours(since_hours: i64) -> Result<i64, NewsError> {
    if (1..=MAX_SINCE_HOURS).contains(&since_hours) {
        Ok(since_hours)
    } else {
        Err(NewsError::InvalidSearchRange(since_hours))
    }
}

/// `[now - since_hours, now]`, or an error when the range is out of bounds.
pub fn search_window(
    now: NaiveDateTime,
    since_hours: i64,
) -> Result<(NaiveDateTime, NaiveDateTime), NewsError> {
    let hours = validate_since_hours(since_hours)?;
    let from = TimeDelta::try_hours(hours)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or(NewsError::InvalidSearchRange(since_hours))?;
    Ok((from, now))
}

enum Cursor {
    First,
    Next { page: u32, total_pages: u32 },
    Done,
}

#[derive(Clone)]
pub struct PaginatedFetcher {
    provider: Arc<dyn SearchProvider>,
    since_hours: i64,
    language: String,
}

impl PaginatedFetcher {
    pub fn new(provider: Arc<dyn SearchProvider>, since_hours: i64, language: impl Into<String>) -> Self {
        Self {
            provider,
            since_hours,
            language: language.into(),
        }
    }

    /// Window `[now - since_hours, now]`, `now` taken at call time.
    pub fn stream<'a>(&'a self, term: &str) -> impl Stream<Item = Article> + Send + 'a {
        self.stream_at(term, Utc::now().naive_utc())
    }

    /// Same as [`stream`](Self::stream) with an explicit window end.
    pub fn stream_at<'a>(
        &'a self,
        term: &str,
        now: NaiveDateTime,
    ) -> impl Stream<Item = Article> + Send + 'a {
        let term = term.to_string();
        let (start, from) = match search_window(now, self.since_hours) {
            Ok((from, _)) => (Cursor::First, from),
            Err(e) => {
                tracing::warn!(target: "fetch", term = %term, error = %e, "search window rejected, skipping term");
                (Cursor::Done, now)
            }
        };

        stream::unfold(start, move |cursor| {
            let term = term.clone();
            async move {
                match cursor {
                    Cursor::Done => None,
                    Cursor::First => self.first_page(&term, from, now).await,
                    Cursor::Next { page, total_pages } => {
                        self.next_page(&term, from, now, page, total_pages).await
                    }
                }
            }
        })
        .flat_map(stream::iter)
    }

    fn query(&self, term: &str, from: NaiveDateTime, to: NaiveDateTime, page: u32) -> SearchQuery {
        SearchQuery {
            term: term.to_string(),
            from,
            to,
            language: self.language.clone(),
            page,
            page_size: PAGE_SIZE,
        }
    }

    async fn first_page(
        &self,
        term: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Option<(Vec<Article>, Cursor)> {
        tracing::info!(target: "fetch", term, %from, %to, "querying provider");
        let page = match self.provider.search(&self.query(term, from, to, 1)).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(target: "fetch", term, error = %e, provider = self.provider.name(), "term request failed, treating as empty");
                counter!("fetch_term_errors_total").increment(1);
                return None;
            }
        };

        let pages = total_pages(page.total_results);
        if pages == 0 {
            tracing::warn!(target: "fetch", term, "no articles found for query");
            return None;
        }
        tracing::debug!(target: "fetch", term, total_results = page.total_results, pages, "results found");
        tracing::info!(target: "fetch", term, page = 1, pages, "extracting page");

        let next = if pages > 1 {
            Cursor::Next {
                page: 2,
                total_pages: pages,
            }
        } else {
            Cursor::Done
        };
        Some((tag_all(page.articles, term), next))
    }

    async fn next_page(
        &self,
        term: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
        page: u32,
        total_pages: u32,
    ) -> Option<(Vec<Article>, Cursor)> {
        let resp = match self.provider.search(&self.query(term, from, to, page)).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(target: "fetch", term, page, pages = total_pages, error = %e, "page request failed, keeping earlier pages");
                counter!("fetch_page_errors_total").increment(1);
                return None;
            }
        };
        tracing::info!(target: "fetch", term, page, pages = total_pages, "extracting page");

        let next = if page < total_pages {
            Cursor::Next {
                page: page + 1,
                total_pages,
            }
        } else {
            Cursor::Done
        };
        Some((tag_all(resp.articles, term), next))
    }
}

fn tag_all(raw: Vec<crate::ingest::types::RawArticle>, term: &str) -> Vec<Article> {
    raw.into_iter().map(|a| a.tag(term)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_is_ceiling_of_hundreds() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(100), 1);
        assert_eq!(total_pages(101), 2);
        assert_eq!(total_pages(250), 3);
    }

    #[test]
    fn window_bounds_are_checked() {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let (from, to) = search_window(now, 1).unwrap();
        assert_eq!(to - from, TimeDelta::hours(1));
        assert!(search_window(now, MAX_SINCE_HOURS).is_ok());

        for bad in [0, -5, MAX_SINCE_HOURS + 1, 9_000_000_000_000_000, i64::MIN] {
            assert!(
                matches!(search_window(now, bad), Err(NewsError::InvalidSearchRange(h)) if h == bad),
                "{bad} accepted"
            );
        }
    }
}
