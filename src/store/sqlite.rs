//! SQLite-backed [`DocumentStore`].
//!
//! Each collection is a table of JSON bodies. `news.identity` carries the
//! identity-key fingerprint under a UNIQUE constraint, so a conflicting insert
//! reports [`InsertOutcome::Duplicate`] instead of writing a second row.

use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use super::{Collection, DocumentStore, InsertOutcome};
use crate::models::{AggregateReport, Article, IdentityKey, MonitoringRecord, Service};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS news (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        identity TEXT NOT NULL UNIQUE,
        search_term TEXT NOT NULL,
        body TEXT NOT NULL,
        entry_dt TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS production (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        body TEXT NOT NULL,
        entry_dt TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS monitoring (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        service TEXT NOT NULL,
        body TEXT NOT NULL,
        entry_dt TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_monitoring_service_dt ON monitoring(service, entry_dt DESC)",
];

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect (creating the file if missing) and ensure the schema exists.
    pub async fn connect(url: &str) -> Result<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("parsing database url {url}"))?
            .create_if_missing(true);
        let options = if in_memory {
            options
        } else {
            options.journal_mode(SqliteJournalMode::Wal)
        };

        // An in-memory database lives and dies with its single connection.
        let pool_opts = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_opts
            .connect_with(options)
            .await
            .with_context(|| format!("connecting to {url}"))?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::info!(target: "store", url, "sqlite document store ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        for stmt in SCHEMA {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .context("creating document store schema")?;
        }
        Ok(())
    }
}

fn fmt_dt(dt: DateTime<Utc>) -> String {
    // Fixed-width so lexical order matches chronological order.
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn find_article(&self, key: &IdentityKey) -> Result<Option<Article>> {
        let body: Option<String> = sqlx::query_scalar("SELECT body FROM news WHERE identity = ?")
            .bind(key.fingerprint())
            .fetch_optional(&self.pool)
            .await?;
        body.map(|b| serde_json::from_str(&b).context("decoding stored article"))
            .transpose()
    }

    async fn insert_article(&self, article: &Article) -> Result<InsertOutcome> {
        let now = Utc::now();
        let mut doc = article.clone();
        doc.entry_dt = Some(now);
        let body = serde_json::to_string(&doc)?;

        let res = sqlx::query(
            r#"
            INSERT INTO news (identity, search_term, body, entry_dt) VALUES (?, ?, ?, ?)
            ON CONFLICT(identity) DO NOTHING
            "#,
        )
        .bind(article.identity_key().fingerprint())
        .bind(&article.search_term)
        .bind(body)
        .bind(fmt_dt(now))
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Ok(InsertOutcome::Duplicate);
        }
        Ok(InsertOutcome::Inserted(res.last_insert_rowid().to_string()))
    }

    async fn scan_articles(&self) -> Result<Vec<Article>> {
        let bodies: Vec<String> = sqlx::query_scalar("SELECT body FROM news ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        bodies
            .iter()
            .map(|b| serde_json::from_str(b).context("decoding stored article"))
            .collect()
    }

    async fn insert_report(&self, report: &AggregateReport) -> Result<String> {
        let mut doc = report.clone();
        let entry_dt = *doc.entry_dt.get_or_insert_with(Utc::now);
        let res = sqlx::query("INSERT INTO production (body, entry_dt) VALUES (?, ?)")
            .bind(serde_json::to_string(&doc)?)
            .bind(fmt_dt(entry_dt))
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid().to_string())
    }

    async fn latest_report(&self) -> Result<Option<AggregateReport>> {
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM production ORDER BY entry_dt DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        body.map(|b| serde_json::from_str(&b).context("decoding stored report"))
            .transpose()
    }

    async fn insert_monitoring(&self, record: &MonitoringRecord) -> Result<String> {
        let res = sqlx::query("INSERT INTO monitoring (service, body, entry_dt) VALUES (?, ?, ?)")
            .bind(record.service.as_str())
            .bind(serde_json::to_string(record)?)
            .bind(fmt_dt(record.entry_dt))
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid().to_string())
    }

    async fn latest_monitoring(&self, service: Service) -> Result<Option<MonitoringRecord>> {
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM monitoring WHERE service = ? ORDER BY entry_dt DESC, id DESC LIMIT 1",
        )
        .bind(service.as_str())
        .fetch_optional(&self.pool)
        .await?;
        body.map(|b| serde_json::from_str(&b).context("decoding monitoring record"))
            .transpose()
    }

    async fn count(&self, collection: Collection) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", collection.as_str());
        let n: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }
}
