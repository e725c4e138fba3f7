// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod aggregate;
pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod retrieve;
pub mod scheduler;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::bootstrap::NewsRuntime;
pub use crate::error::NewsError;
pub use crate::models::{AggregateReport, Article, MonitoringRecord, Service};
