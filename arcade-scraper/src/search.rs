//! Keyword search adapter.
//!
//! One request per configured term against a JSON query endpoint. A term
//! whose request fails, whose response is not the expected JSON, or whose
//! result list is empty is logged as a warning and skipped; the remaining
//! terms still run.

use serde::Deserialize;

use crate::adapter::{CandidateItem, Discovery, SourceAdapter, SourceFailure};
use crate::client::HttpFetch;
use crate::error::ScrapeError;

/// Discovers candidates via a search endpoint.
pub struct SearchAdapter {
    source: String,
    /// URL template with a `{query}` placeholder.
    search_url: String,
    terms: Vec<String>,
}

/// Expected response envelope from the search endpoint.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// One search hit. Search sources expose real popularity metrics, which
/// are carried through so the normalizer never overwrites them.
#[derive(Debug, Deserialize)]
struct SearchResult {
    title: String,
    url: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    plays: Option<u64>,
}

impl SearchAdapter {
    pub fn new(
        source: impl Into<String>,
        search_url: impl Into<String>,
        terms: Vec<String>,
    ) -> Self {
        Self {
            source: source.into(),
            search_url: search_url.into(),
            terms,
        }
    }

    fn search_url_for(&self, term: &str) -> String {
        self.search_url.replace("{query}", &encode_term(term))
    }
}

#[async_trait::async_trait]
impl SourceAdapter for SearchAdapter {
    fn name(&self) -> &str {
        "search"
    }

    fn source(&self) -> &str {
        &self.source
    }

    async fn discover(&self, fetch: &dyn HttpFetch) -> Result<Discovery, ScrapeError> {
        let mut discovery = Discovery::default();

        for term in &self.terms {
            let url = self.search_url_for(term);
            discovery.requests += 1;

            let resp = match fetch.fetch(&url).await {
                Ok(resp) => resp,
                Err(e) => {
                    log::warn!("Search for '{}' failed, skipping term: {}", term, e);
                    discovery.failures.push(SourceFailure {
                        source: self.source.clone(),
                        target: term.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let parsed: SearchResponse = match serde_json::from_str(&resp.body) {
                Ok(p) => p,
                Err(e) => {
                    log::warn!(
                        "Search for '{}' returned unparseable payload, skipping term: {}",
                        term,
                        e
                    );
                    discovery.failures.push(SourceFailure {
                        source: self.source.clone(),
                        target: term.clone(),
                        message: format!("unparseable search payload: {e}"),
                    });
                    continue;
                }
            };

            if parsed.results.is_empty() {
                log::warn!("Search for '{}' returned no results", term);
                continue;
            }

            log::info!("Search '{}': {} results", term, parsed.results.len());
            for hit in parsed.results {
                discovery.items.push(CandidateItem {
                    title: hit.title,
                    url: hit.url,
                    description: hit.description,
                    thumbnail: hit.thumbnail,
                    published_at: hit.published_at,
                    category_hint: hit.category,
                    rating: hit.rating,
                    plays: hit.plays,
                    source: self.source.clone(),
                });
            }
        }

        Ok(discovery)
    }
}

/// Minimal query-string encoding for search terms.
fn encode_term(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.trim().chars() {
        match c {
            ' ' => out.push('+'),
            c if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') => out.push(c),
            c => {
                let mut bytes = [0u8; 4];
                for b in c.encode_utf8(&mut bytes).as_bytes() {
                    out.push_str(&format!("%{b:02X}"));
                }
            }
        }
    }
    out
}
