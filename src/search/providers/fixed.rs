//! Static search provider — serves results from config.
//! Lets the full pipeline run offline without a search credential.

use crate::search::SearchContext;

#[derive(Debug, Clone)]
pub struct StaticProvider {
    results: Vec<(String, String)>,
    max_results: usize,
}

impl StaticProvider {
    pub fn new(results: Vec<(String, String)>, max_results: usize) -> Self {
        Self { results, max_results }
    }

    /// The query is ignored; every call yields the configured results.
    pub fn search(&self, _query: &str) -> SearchContext {
        SearchContext::from_pairs(self.results.iter().cloned(), self.max_results)
    }
}
