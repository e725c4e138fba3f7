// src/ingest/terms.rs
//! Keyword → search-term compilation.
//!
//! A compiled term is lower-cased and trimmed; multi-word phrases are wrapped
//! in double quotes so the provider matches them as a phrase. The same string
//! is stored as `search_term` on every article it surfaces.

use std::collections::HashSet;

fn is_phrase(term: &str) -> bool {
    term.split_whitespace().nth(1).is_some()
}

/// Normalize, quote and deduplicate raw keywords. First occurrence wins, so
/// the output order follows the input order.
pub fn compile_terms<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for term in raw {
        let t = term.as_ref().trim().to_lowercase();
        if t.is_empty() {
            continue;
        }
        let compiled = if is_phrase(&t) { format!("\"{t}\"") } else { t };
        if seen.insert(compiled.clone()) {
            out.push(compiled);
        }
    }
    out
}

/// Join terms into one boolean-OR query for providers that accept compound
/// queries. Phrases are quoted; case is preserved.
pub fn join_or_query<S: AsRef<str>>(terms: &[S]) -> String {
    terms
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .map(|t| {
            if is_phrase(t) && !(t.starts_with('"') && t.ends_with('"')) {
                format!("\"{t}\"")
            } else {
                t.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}
