//! The discovery contract shared by all source adapters.

use crate::client::HttpFetch;
use crate::error::ScrapeError;

/// A raw, not-yet-normalized reference to a potential catalog entry.
///
/// Only `title`, `url`, and `source` are guaranteed; everything else is
/// whatever the upstream source happened to expose. Optional metrics
/// (`rating`, `plays`) are real upstream values and must survive
/// normalization untouched.
#[derive(Debug, Clone, Default)]
pub struct CandidateItem {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    /// Raw publish date string as the source emitted it (RFC 2822 for RSS,
    /// RFC 3339 for JSON APIs).
    pub published_at: Option<String>,
    /// Category name as the source labels it, to be mapped through the
    /// source's category table.
    pub category_hint: Option<String>,
    pub rating: Option<f64>,
    pub plays: Option<u64>,
    /// Provider tag of the adapter that produced this item.
    pub source: String,
}

/// A single failed request or term, kept for the run report.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source: String,
    /// URL or search term that triggered the failure.
    pub target: String,
    pub message: String,
}

/// What one adapter run produced.
#[derive(Debug, Default)]
pub struct Discovery {
    pub items: Vec<CandidateItem>,
    /// Pages/requests attempted, including failed ones.
    pub requests: u32,
    pub failures: Vec<SourceFailure>,
}

/// A source-specific discovery strategy over one external origin.
///
/// Implementations must go through the [`HttpFetch`] seam for every request
/// so they inherit the client's pacing, and must confine failures to the
/// narrowest scope that still makes progress: a bad item is skipped, a bad
/// page ends one category, a bad feed fails only that adapter.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Human-readable adapter name for logs.
    fn name(&self) -> &str;

    /// Provider tag stamped onto produced records.
    fn source(&self) -> &str;

    async fn discover(&self, fetch: &dyn HttpFetch) -> Result<Discovery, ScrapeError>;
}
