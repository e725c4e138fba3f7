//! # Document store
//! Storage seam for the three logical collections (`news`, `production`,
//! `monitoring`). Ingestion, scheduling and aggregation only talk to the
//! [`DocumentStore`] trait; backends live in [`memory`] and [`sqlite`].
//!
//! Implementations must enforce identity-key uniqueness on `news` at insert
//! time, so the find-then-insert sequence in ingestion can never produce two
//! documents for the same article even if two runs overlap.

pub mod memory;
pub mod sqlite;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::NewsError;
use crate::models::{AggregateReport, Article, IdentityKey, MonitoringRecord, Service};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Shared handle used across jobs and the HTTP layer.
pub type SharedStore = Arc<dyn DocumentStore>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    News,
    Production,
    Monitoring,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::News, Collection::Production, Collection::Monitoring];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::News => "news",
            Collection::Production => "production",
            Collection::Monitoring => "monitoring",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = NewsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(Collection::News),
            "production" => Ok(Collection::Production),
            "monitoring" => Ok(Collection::Monitoring),
            _ => Err(NewsError::InvalidCollection(s.to_string())),
        }
    }
}

/// Result of inserting an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// New document id.
    Inserted(String),
    /// An article with the same identity key is already stored.
    Duplicate,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stored article with the given identity key, if any.
    async fn find_article(&self, key: &IdentityKey) -> Result<Option<Article>>;

    /// Insert a new article, stamping `entry_dt` with the insert time.
    async fn insert_article(&self, article: &Article) -> Result<InsertOutcome>;

    /// Every stored article, in insertion order.
    async fn scan_articles(&self) -> Result<Vec<Article>>;

    async fn insert_report(&self, report: &AggregateReport) -> Result<String>;

    async fn latest_report(&self) -> Result<Option<AggregateReport>>;

    async fn insert_monitoring(&self, record: &MonitoringRecord) -> Result<String>;

    /// Most recent entry for `service`, ordered by `entry_dt` descending.
    async fn latest_monitoring(&self, service: Service) -> Result<Option<MonitoringRecord>>;

    async fn count(&self, collection: Collection) -> Result<u64>;
}

/// Open the backend named by a database URL: `memory://` or a sqlx SQLite URL.
pub async fn connect(database_url: &str) -> Result<SharedStore> {
    if database_url.trim().eq_ignore_ascii_case("memory://") {
        tracing::info!(target: "store", "using in-memory document store");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = SqliteStore::connect(database_url).await?;
    Ok(Arc::new(store))
}
