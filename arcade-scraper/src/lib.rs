//! Source discovery for the catalog ingestion pipeline.
//!
//! Everything that touches the network lives here: the rate-limited fetch
//! client, the retry/backoff state machine, and the source adapters (RSS
//! feed, paginated category listings, keyword search) that turn raw
//! responses into [`CandidateItem`]s for normalization downstream.

pub mod adapter;
pub mod category;
pub mod client;
pub mod error;
pub mod feed;
pub mod search;

pub use adapter::{CandidateItem, Discovery, SourceAdapter, SourceFailure};
pub use category::CategoryPagesAdapter;
pub use client::{Backoff, FetchOptions, FetchResponse, HttpFetch, RateLimitedClient};
pub use error::ScrapeError;
pub use feed::FeedAdapter;
pub use search::SearchAdapter;
