// src/ingest/mod.rs
pub mod config;
pub mod fetcher;
pub mod providers;
pub mod terms;
pub mod types;

use std::pin::pin;

use anyhow::{Context, Result};
use futures::StreamExt;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::ingest::fetcher::PaginatedFetcher;
use crate::ingest::terms::compile_terms;
use crate::models::{Article, MonitoringRecord};
use crate::store::{InsertOutcome, SharedStore};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_articles_seen_total", "Articles streamed from the provider.");
        describe_counter!("ingest_added_total", "Articles newly persisted.");
        describe_counter!(
            "ingest_duplicates_total",
            "Articles skipped because their identity key is already stored."
        );
        describe_counter!(
            "ingest_insert_errors_total",
            "Articles that failed to persist (skipped, not retried)."
        );
        describe_counter!("fetch_term_errors_total", "Terms whose first page failed.");
        describe_counter!("fetch_page_errors_total", "Later pages that failed.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when ingestion last completed.");
    });
}

/// Outcome of one ingestion pass.
#[derive(Debug, Clone, Default)]
pub struct IngestionSummary {
    /// Compiled terms, in query order.
    pub terms: Vec<String>,
    /// Every article seen, duplicates included, in fetch order.
    pub articles: Vec<Article>,
    pub total_added: u64,
    pub duplicates: u64,
    pub failed: u64,
}

/// Fetch → dedup → persist.
pub struct IngestionEngine {
    fetcher: PaginatedFetcher,
    store: SharedStore,
}

impl IngestionEngine {
    pub fn new(fetcher: PaginatedFetcher, store: SharedStore) -> Self {
        Self { fetcher, store }
    }

    /// Run one pass over `raw_terms` without recording it in the monitoring log.
    pub async fn ingest(&self, raw_terms: &[String]) -> IngestionSummary {
        ensure_metrics_described();

        let terms = compile_terms(raw_terms);
        let mut summary = IngestionSummary {
            terms: terms.clone(),
            ..Default::default()
        };

        for term in &terms {
            let mut articles = pin!(self.fetcher.stream(term));
            while let Some(article) = articles.next().await {
                counter!("ingest_articles_seen_total").increment(1);
                self.persist(&article, &mut summary).await;
                summary.articles.push(article);
            }
        }

        counter!("ingest_added_total").increment(summary.total_added);
        counter!("ingest_duplicates_total").increment(summary.duplicates);
        counter!("ingest_insert_errors_total").increment(summary.failed);
        gauge!("ingest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

        tracing::info!(
            target: "ingest",
            terms = ?summary.terms,
            seen = summary.articles.len(),
            added = summary.total_added,
            duplicates = summary.duplicates,
            failed = summary.failed,
            "ingestion pass finished"
        );
        summary
    }

    /// Full run: ingest, then append the `ingestion` monitoring record.
    pub async fn run(&self, raw_terms: &[String]) -> Result<(IngestionSummary, MonitoringRecord)> {
        let summary = self.ingest(raw_terms).await;
        let record = MonitoringRecord::ingestion(summary.terms.clone(), summary.total_added);
        self.store
            .insert_monitoring(&record)
            .await
            .context("recording ingestion run")?;
        Ok((summary, record))
    }

    async fn persist(&self, article: &Article, summary: &mut IngestionSummary) {
        let key = article.identity_key();
        let source = article.source_name.as_deref().unwrap_or("Unknown");

        match self.store.find_article(&key).await {
            Ok(Some(_)) => {
                tracing::debug!(target: "ingest", source, title = %article.title, "article already stored, ignoring");
                summary.duplicates += 1;
                return;
            }
            Ok(None) => {}
            Err(e) => {
                // Lookup failed; let the insert's uniqueness check decide.
                tracing::warn!(target: "ingest", error = %e, "existence check failed");
            }
        }

        match self.store.insert_article(article).await {
            Ok(InsertOutcome::Inserted(id)) => {
                tracing::info!(target: "ingest", source, id, title = %article.title, "article added");
                summary.total_added += 1;
            }
            Ok(InsertOutcome::Duplicate) => {
                tracing::debug!(target: "ingest", source, title = %article.title, "article stored concurrently, ignoring");
                summary.duplicates += 1;
            }
            Err(e) => {
                tracing::error!(target: "ingest", source, title = %article.title, error = ?e, "article not indexed, skipping");
                summary.failed += 1;
            }
        }
    }
}
