//! Web search abstraction.
//!
//! `SearchProvider` is an enum over concrete backends, mirroring
//! [`crate::llm::LlmProvider`]. Search output is advisory: the relay turns
//! any [`SearchError`] into an empty [`SearchContext`] and carries on.

pub mod providers;

use thiserror::Error;

/// Substituted for the context block when no usable result came back.
pub const NO_RESULTS: &str = "No web results found";

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("unknown search provider: {0}")]
    UnknownProvider(String),
    #[error("search credential missing (set SEARCH_API_KEY)")]
    MissingCredential,
    #[error("search request failed: {0}")]
    Request(String),
    #[error("malformed search response: {0}")]
    Malformed(String),
}

// ── Results ───────────────────────────────────────────────────────────────────

/// One ranked result. `rank` starts at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub rank: usize,
    pub title: String,
    pub snippet: String,
}

/// Per-request ranked result list. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchContext {
    hits: Vec<SearchHit>,
}

impl SearchContext {
    /// Rank `(title, snippet)` pairs in order, dropping blank snippets and
    /// keeping at most `max_results`.
    pub fn from_pairs<I>(pairs: I, max_results: usize) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let hits = pairs
            .into_iter()
            .map(|(title, snippet)| (title.trim().to_string(), snippet.trim().to_string()))
            .filter(|(_, snippet)| !snippet.is_empty())
            .take(max_results)
            .enumerate()
            .map(|(i, (title, snippet))| SearchHit { rank: i + 1, title, snippet })
            .collect();
        Self { hits }
    }

    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Numbered plain-text block, one `"{rank}. {title}: {snippet}"` line
    /// per hit, or [`NO_RESULTS`] when there are none.
    pub fn format(&self) -> String {
        if self.hits.is_empty() {
            return NO_RESULTS.to_string();
        }
        self.hits
            .iter()
            .map(|h| format!("{}. {}: {}", h.rank, h.title, h.snippet))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available search backends.
#[derive(Debug, Clone)]
pub enum SearchProvider {
    Serper(providers::serper::SerperProvider),
    Static(providers::fixed::StaticProvider),
    /// Search switched off; every query yields an empty context.
    Disabled,
}

impl SearchProvider {
    /// Fails when the backend needs a credential that was never configured.
    /// The relay checks this before making any outbound call.
    pub fn ensure_configured(&self) -> Result<(), SearchError> {
        match self {
            SearchProvider::Serper(p) if !p.has_credential() => Err(SearchError::MissingCredential),
            _ => Ok(()),
        }
    }

    /// Run `query` and return the ranked results.
    pub async fn search(&self, query: &str) -> Result<SearchContext, SearchError> {
        match self {
            SearchProvider::Serper(p) => p.search(query).await,
            SearchProvider::Static(p) => Ok(p.search(query)),
            SearchProvider::Disabled => Ok(SearchContext::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SearchProvider::Serper(_) => "serper",
            SearchProvider::Static(_) => "static",
            SearchProvider::Disabled => "none",
        }
    }
}
