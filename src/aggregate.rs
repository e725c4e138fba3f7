//! # Aggregation
//! Folds the stored corpus into an [`AggregateReport`]: counts per
//! year/month/date globally and per search term, plus per source/author.
//!
//! Every run rescans the whole `news` collection and starts from empty
//! counters; nothing is carried over from earlier reports. The fold itself is
//! pure ([`fold_articles`]) and sits behind [`Aggregator`] so a different
//! strategy can produce the same report shape.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use metrics::{counter, gauge};

use crate::models::{AggregateReport, Article, MonitoringRecord, PeriodCounts};
use crate::store::SharedStore;

/// Bucket label used when an article has no source name or author.
pub const UNKNOWN: &str = "Unknown";

#[async_trait]
pub trait Aggregator: Send + Sync {
    /// Build a fresh report from the store.
    async fn build_report(&self, store: &SharedStore) -> Result<AggregateReport>;
}

/// Rebuilds everything from a full scan on each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullScanAggregator;

#[async_trait]
impl Aggregator for FullScanAggregator {
    async fn build_report(&self, store: &SharedStore) -> Result<AggregateReport> {
        let articles = store.scan_articles().await.context("scanning news collection")?;
        Ok(fold_articles(&articles))
    }
}

/// Date part of `publishedAt` (everything before `T`).
pub fn published_date(published_at: &str) -> Option<NaiveDate> {
    let day = published_at.split('T').next()?.trim();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl PeriodCounts {
    fn bump(&mut self, date: NaiveDate) {
        *self.year.entry(date.year().to_string()).or_insert(0) += 1;
        *self.month.entry(date.format("%Y-%m").to_string()).or_insert(0) += 1;
        *self.date.entry(date.format("%Y-%m-%d").to_string()).or_insert(0) += 1;
    }
}

pub fn fold_articles<'a, I>(articles: I) -> AggregateReport
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut report = AggregateReport::default();
    let mut by_source: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();

    for article in articles {
        let Some(date) = published_date(&article.published_at) else {
            tracing::warn!(
                target: "aggregate",
                published_at = %article.published_at,
                title = %article.title,
                "unparseable publishedAt, article left out of report"
            );
            report.skipped += 1;
            continue;
        };

        report.news_count_period.bump(date);
        report
            .keyword_count_period
            .entry(article.search_term.clone())
            .or_default()
            .bump(date);

        let source = article.source_name.as_deref().unwrap_or(UNKNOWN);
        let author = article.author.as_deref().unwrap_or(UNKNOWN);
        *by_source
            .entry(source.to_string())
            .or_default()
            .entry(author.to_string())
            .or_insert(0) += 1;

        report.articles_scanned += 1;
    }

    report.news_count_source = by_source;
    report
}

/// One aggregation run: build, persist to `production`, record in `monitoring`.
pub async fn run_aggregation(
    aggregator: &dyn Aggregator,
    store: &SharedStore,
) -> Result<(AggregateReport, MonitoringRecord)> {
    let mut report = aggregator.build_report(store).await?;
    report.entry_dt = Some(Utc::now());

    let id = store
        .insert_report(&report)
        .await
        .context("writing aggregate report")?;

    let record = MonitoringRecord::aggregation();
    store
        .insert_monitoring(&record)
        .await
        .context("recording aggregation run")?;

    counter!("aggregate_runs_total").increment(1);
    gauge!("aggregate_last_run_ts").set(Utc::now().timestamp() as f64);
    tracing::info!(
        target: "aggregate",
        id,
        scanned = report.articles_scanned,
        skipped = report.skipped,
        keywords = report.keyword_count_period.len(),
        sources = report.news_count_source.len(),
        "aggregate report indexed"
    );
    Ok((report, record))
}
