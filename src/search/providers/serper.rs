//! Serper-style web search provider (`POST {"q": ...}` → `organic[]`).
//!
//! Wire types are private to this module. A response without an `organic`
//! list is a valid, empty result; anything that is not JSON is malformed.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::search::{SearchContext, SearchError};

#[derive(Debug, Clone)]
pub struct SerperProvider {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    max_results: usize,
}

impl SerperProvider {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        max_results: usize,
        timeout_seconds: u64,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| SearchError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_url, api_key, max_results })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn search(&self, query: &str) -> Result<SearchContext, SearchError> {
        let key = self.api_key.as_deref().ok_or(SearchError::MissingCredential)?;

        debug!(url = %self.api_url, query_len = query.len(), "sending search request");

        let response = self
            .client
            .post(&self.api_url)
            .header("X-API-KEY", key)
            .json(&SearchRequest { q: query })
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "search provider returned HTTP error");
            return Err(SearchError::Request(format!("HTTP {status}: {body}")));
        }

        let parsed = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| SearchError::Malformed(e.to_string()))?;

        let ctx = SearchContext::from_pairs(
            parsed.organic.into_iter().map(|o| (o.title, o.snippet)),
            self.max_results,
        );
        debug!(hits = ctx.hits().len(), "received search response");
        Ok(ctx)
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}
