//! Typed failures that callers branch on. Everything else travels as
//! `anyhow::Error` with context attached.

use thiserror::Error;

/// Languages the retrieval path accepts.
pub const ACCEPTED_LANGUAGES: [&str; 2] = ["en", "br"];

/// Widest search window, in hours, a request may ask for.
pub const MAX_SINCE_HOURS: i64 = 720;

#[derive(Debug, Error)]
pub enum NewsError {
    /// Search provider answered with a non-success status.
    #[error("search provider returned HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("unsupported language '{0}', expected one of en, br")]
    UnsupportedLanguage(String),

    #[error("invalid search range {0}h, expected 1..=720")]
    InvalidSearchRange(i64),

    #[error("invalid collection name '{0}', expected one of news, production, monitoring")]
    InvalidCollection(String),

    #[error("invalid service name '{0}', expected one of ingestion, aggregation")]
    UnknownService(String),

    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),
}

impl NewsError {
    /// Client-side rejections (as opposed to infrastructure failures).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            NewsError::UnsupportedLanguage(_) | NewsError::InvalidSearchRange(_)
        )
    }
}
