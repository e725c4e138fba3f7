//! # Models
//! Documents persisted by the monitor: articles, monitoring entries and
//! aggregate reports.
//!
//! Field names on the wire follow the provider payload (`publishedAt`,
//! `urlToImage`) so a stored article reads like the API response it came from.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::NewsError;

/// One ingested news item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    #[serde(default)]
    pub source_id: Option<String>,
    pub source_name: Option<String>,
    pub author: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "urlToImage")]
    pub url_to_image: Option<String>,
    /// ISO-8601 as delivered by the provider; string-comparable.
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    #[serde(default)]
    pub content: Option<String>,
    /// Compiled term that surfaced the article.
    pub search_term: String,
    /// Stamped by the store at insert time.
    #[serde(default)]
    pub entry_dt: Option<DateTime<Utc>>,
}

impl Article {
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            source_name: self.source_name.clone(),
            title: self.title.clone(),
            published_at: self.published_at.clone(),
            search_term: self.search_term.clone(),
        }
    }
}

/// `(source_name, title, published_at, search_term)`: two articles with equal
/// keys are the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
    pub source_name: Option<String>,
    pub title: String,
    pub published_at: String,
    pub search_term: String,
}

impl IdentityKey {
    /// Stable hex digest of the key, used as a uniqueness column.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        // Length-prefix each part so ("ab","c") and ("a","bc") differ.
        match &self.source_name {
            Some(s) => {
                hasher.update([1u8]);
                hasher.update((s.len() as u64).to_le_bytes());
                hasher.update(s.as_bytes());
            }
            None => hasher.update([0u8]),
        }
        for part in [&self.title, &self.published_at, &self.search_term] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Recurring job kinds recorded in the monitoring log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Ingestion,
    Aggregation,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Ingestion => "ingestion",
            Service::Aggregation => "aggregation",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = NewsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ingestion" => Ok(Service::Ingestion),
            "aggregation" => Ok(Service::Aggregation),
            other => Err(NewsError::UnknownService(other.to_string())),
        }
    }
}

/// Append-only audit entry for one completed job run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitoringRecord {
    pub service: Service,
    pub terms: Option<Vec<String>>,
    pub total_added: Option<u64>,
    pub entry_dt: DateTime<Utc>,
}

impl MonitoringRecord {
    pub fn ingestion(terms: Vec<String>, total_added: u64) -> Self {
        Self {
            service: Service::Ingestion,
            terms: Some(terms),
            total_added: Some(total_added),
            entry_dt: Utc::now(),
        }
    }

    pub fn aggregation() -> Self {
        Self {
            service: Service::Aggregation,
            terms: None,
            total_added: None,
            entry_dt: Utc::now(),
        }
    }
}

/// Counts bucketed by `YYYY`, `YYYY-MM` and `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodCounts {
    pub year: BTreeMap<String, u64>,
    pub month: BTreeMap<String, u64>,
    pub date: BTreeMap<String, u64>,
}

/// Full-corpus statistical snapshot written once per aggregation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregateReport {
    pub news_count_period: PeriodCounts,
    pub keyword_count_period: BTreeMap<String, PeriodCounts>,
    /// source name → author → count
    pub news_count_source: BTreeMap<String, BTreeMap<String, u64>>,
    /// Articles folded into the buckets.
    pub articles_scanned: u64,
    /// Articles left out because `publishedAt` had no parseable date.
    pub skipped: u64,
    #[serde(default)]
    pub entry_dt: Option<DateTime<Utc>>,
}
