// src/ingest/config.rs
//! Monitored keyword list.
//!
//! The list lives in a terms file whose format is chosen by its extension:
//!
//! ```toml
//! terms = ["genomics", "dna", "genetic diseases"]
//! ```
//!
//! JSON accepts the same table or a bare array. Entries are trimmed and blanks
//! dropped; case folding and dedup happen at term compilation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

const ENV_PATH: &str = "NEWS_TERMS_PATH";
const CANDIDATES: [&str; 2] = ["config/news_terms.toml", "config/news_terms.json"];

/// Keywords monitored when no terms file is present.
pub const DEFAULT_TERMS: [&str; 3] = ["genomics", "dna", "genetic diseases"];

#[derive(Debug, Deserialize)]
struct TermsFile {
    terms: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonTerms {
    Table(TermsFile),
    List(Vec<String>),
}

impl From<JsonTerms> for TermsFile {
    fn from(j: JsonTerms) -> Self {
        match j {
            JsonTerms::Table(t) => t,
            JsonTerms::List(terms) => TermsFile { terms },
        }
    }
}

impl TermsFile {
    fn parse(path: &Path, content: &str) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("toml") => toml::from_str(content).context("parsing TOML terms file"),
            Some("json") => serde_json::from_str::<JsonTerms>(content)
                .map(Into::into)
                .context("parsing JSON terms file"),
            _ => bail!("terms file {} must end in .toml or .json", path.display()),
        }
    }

    fn into_terms(self) -> Vec<String> {
        self.terms
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Read keywords from an explicit `.toml` or `.json` file.
pub fn load_terms_from(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading terms from {}", path.display()))?;
    Ok(TermsFile::parse(path, &content)?.into_terms())
}

/// `$NEWS_TERMS_PATH` if set (it must exist), else the first file found under
/// `config/`, else [`DEFAULT_TERMS`].
pub fn load_terms_default() -> Result<Vec<String>> {
    match terms_path()? {
        Some(path) => {
            let terms = load_terms_from(&path)?;
            tracing::info!(target: "ingest", path = %path.display(), count = terms.len(), "loaded monitored terms");
            Ok(terms)
        }
        None => Ok(DEFAULT_TERMS.iter().map(|t| t.to_string()).collect()),
    }
}

fn terms_path() -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let path = PathBuf::from(p);
        if !path.exists() {
            bail!("{ENV_PATH} points to missing file {}", path.display());
        }
        return Ok(Some(path));
    }
    Ok(CANDIDATES.iter().map(PathBuf::from).find(|p| p.exists()))
}
