//! In-process [`DocumentStore`] for tests and `memory://` runs.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use super::{Collection, DocumentStore, InsertOutcome};
use crate::models::{AggregateReport, Article, IdentityKey, MonitoringRecord, Service};

#[derive(Debug, Default)]
struct Inner {
    news: Vec<Article>,
    keys: HashSet<IdentityKey>,
    production: Vec<AggregateReport>,
    monitoring: Vec<MonitoringRecord>,
    next_id: u64,
}

impl Inner {
    fn next_id(&mut self, collection: Collection) -> String {
        self.next_id += 1;
        format!("{}-{}", collection, self.next_id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_article(&self, key: &IdentityKey) -> Result<Option<Article>> {
        let inner = self.lock();
        if !inner.keys.contains(key) {
            return Ok(None);
        }
        Ok(inner.news.iter().find(|a| &a.identity_key() == key).cloned())
    }

    async fn insert_article(&self, article: &Article) -> Result<InsertOutcome> {
        let mut inner = self.lock();
        if !inner.keys.insert(article.identity_key()) {
            return Ok(InsertOutcome::Duplicate);
        }
        let mut doc = article.clone();
        doc.entry_dt = Some(Utc::now());
        inner.news.push(doc);
        Ok(InsertOutcome::Inserted(inner.next_id(Collection::News)))
    }

    async fn scan_articles(&self) -> Result<Vec<Article>> {
        Ok(self.lock().news.clone())
    }

    async fn insert_report(&self, report: &AggregateReport) -> Result<String> {
        let mut inner = self.lock();
        let mut doc = report.clone();
        doc.entry_dt.get_or_insert_with(Utc::now);
        inner.production.push(doc);
        Ok(inner.next_id(Collection::Production))
    }

    async fn latest_report(&self) -> Result<Option<AggregateReport>> {
        Ok(self.lock().production.last().cloned())
    }

    async fn insert_monitoring(&self, record: &MonitoringRecord) -> Result<String> {
        let mut inner = self.lock();
        inner.monitoring.push(record.clone());
        Ok(inner.next_id(Collection::Monitoring))
    }

    async fn latest_monitoring(&self, service: Service) -> Result<Option<MonitoringRecord>> {
        let inner = self.lock();
        Ok(inner
            .monitoring
            .iter()
            .filter(|r| r.service == service)
            .max_by_key(|r| r.entry_dt)
            .cloned())
    }

    async fn count(&self, collection: Collection) -> Result<u64> {
        let inner = self.lock();
        let n = match collection {
            Collection::News => inner.news.len(),
            Collection::Production => inner.production.len(),
            Collection::Monitoring => inner.monitoring.len(),
        };
        Ok(n as u64)
    }
}
