//! Paginated category listing adapter.
//!
//! Walks page 1..N of each configured category, pulling candidate links out
//! of the page body with a regex. A page with zero candidate links means the
//! listing is exhausted; a fetch error ends that category. Either way the
//! remaining categories continue independently.

use regex::Regex;

use crate::adapter::{CandidateItem, Discovery, SourceAdapter, SourceFailure};
use crate::client::HttpFetch;
use crate::error::ScrapeError;

/// Default pattern: anchor tags whose href points at a game page, with the
/// anchor text as the title.
const DEFAULT_LINK_PATTERN: &str =
    r#"<a[^>]+href="(?P<href>[^"]*/game/[^"]+)"[^>]*>(?P<title>[^<]+)</a>"#;

/// Discovers candidates from paginated category listings.
pub struct CategoryPagesAdapter {
    source: String,
    /// URL template with `{category}` and `{page}` placeholders.
    page_url: String,
    categories: Vec<String>,
    max_pages: u32,
    link_regex: Regex,
}

impl CategoryPagesAdapter {
    pub fn new(
        source: impl Into<String>,
        page_url: impl Into<String>,
        categories: Vec<String>,
        max_pages: u32,
    ) -> Result<Self, ScrapeError> {
        Self::with_pattern(source, page_url, categories, max_pages, DEFAULT_LINK_PATTERN)
    }

    /// Use a custom link-extraction pattern. The pattern must expose
    /// `href` and `title` named captures.
    pub fn with_pattern(
        source: impl Into<String>,
        page_url: impl Into<String>,
        categories: Vec<String>,
        max_pages: u32,
        pattern: &str,
    ) -> Result<Self, ScrapeError> {
        let link_regex = Regex::new(pattern)
            .map_err(|e| ScrapeError::Config(format!("bad link pattern: {e}")))?;
        if !link_regex.capture_names().flatten().any(|n| n == "href")
            || !link_regex.capture_names().flatten().any(|n| n == "title")
        {
            return Err(ScrapeError::Config(
                "link pattern must have 'href' and 'title' captures".to_string(),
            ));
        }
        Ok(Self {
            source: source.into(),
            page_url: page_url.into(),
            categories,
            max_pages,
            link_regex,
        })
    }

    fn page_url_for(&self, category: &str, page: u32) -> String {
        self.page_url
            .replace("{category}", category)
            .replace("{page}", &page.to_string())
    }

    /// Extract candidate links from one page body.
    fn extract(&self, body: &str, category: &str) -> Vec<CandidateItem> {
        let origin = url_origin(&self.page_url);
        self.link_regex
            .captures_iter(body)
            .filter_map(|caps| {
                let href = caps.name("href")?.as_str();
                let title = caps.name("title")?.as_str().trim();
                if title.is_empty() {
                    return None;
                }
                Some(CandidateItem {
                    title: title.to_string(),
                    url: resolve_url(&origin, href),
                    category_hint: Some(category.to_string()),
                    source: self.source.clone(),
                    ..Default::default()
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl SourceAdapter for CategoryPagesAdapter {
    fn name(&self) -> &str {
        "category-pages"
    }

    fn source(&self) -> &str {
        &self.source
    }

    async fn discover(&self, fetch: &dyn HttpFetch) -> Result<Discovery, ScrapeError> {
        let mut discovery = Discovery::default();

        for category in &self.categories {
            for page in 1..=self.max_pages {
                let url = self.page_url_for(category, page);
                discovery.requests += 1;

                let resp = match fetch.fetch(&url).await {
                    Ok(resp) => resp,
                    Err(e) => {
                        log::warn!(
                            "Category '{}' page {} failed, moving to next category: {}",
                            category,
                            page,
                            e
                        );
                        discovery.failures.push(SourceFailure {
                            source: self.source.clone(),
                            target: url,
                            message: e.to_string(),
                        });
                        break;
                    }
                };

                let items = self.extract(&resp.body, category);
                if items.is_empty() {
                    // End of listing for this category.
                    log::info!(
                        "Category '{}' exhausted at page {} ({} status)",
                        category,
                        page,
                        resp.status
                    );
                    break;
                }

                log::info!(
                    "Category '{}' page {}: {} candidate links",
                    category,
                    page,
                    items.len()
                );
                discovery.items.extend(items);
            }
        }

        Ok(discovery)
    }
}

/// Scheme + host of a URL template, for resolving relative hrefs.
fn url_origin(url: &str) -> String {
    if let Some(scheme_end) = url.find("://") {
        let rest = &url[scheme_end + 3..];
        let host_end = rest.find('/').unwrap_or(rest.len());
        return url[..scheme_end + 3 + host_end].to_string();
    }
    String::new()
}

fn resolve_url(origin: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        format!("{origin}/{href}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::testing::ScriptedFetch;

    fn page_with_links(n: usize) -> String {
        let mut body = String::from("<html><body><ul>");
        for i in 0..n {
            body.push_str(&format!(
                r#"<li><a class="card" href="/game/sample-{i}/">Sample {i}</a></li>"#
            ));
        }
        body.push_str("</ul></body></html>");
        body
    }

    fn adapter(categories: &[&str], max_pages: u32) -> CategoryPagesAdapter {
        CategoryPagesAdapter::new(
            "gamesite",
            "https://games.example.com/c/{category}?page={page}",
            categories.iter().map(|s| s.to_string()).collect(),
            max_pages,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn stops_paginating_on_empty_page() {
        let fetch = ScriptedFetch::new()
            .ok("https://games.example.com/c/puzzle?page=1", &page_with_links(5))
            .ok("https://games.example.com/c/puzzle?page=2", &page_with_links(0));
        let adapter = adapter(&["puzzle"], 10);

        let discovery = adapter.discover(&fetch).await.unwrap();
        assert_eq!(discovery.items.len(), 5);
        assert_eq!(discovery.requests, 2);
        assert!(discovery.failures.is_empty());
    }

    #[tokio::test]
    async fn fetch_error_ends_one_category_only() {
        let fetch = ScriptedFetch::new()
            .status("https://games.example.com/c/puzzle?page=1", 500)
            .ok("https://games.example.com/c/racing?page=1", &page_with_links(3))
            .ok("https://games.example.com/c/racing?page=2", &page_with_links(0));
        let adapter = adapter(&["puzzle", "racing"], 10);

        let discovery = adapter.discover(&fetch).await.unwrap();
        assert_eq!(discovery.items.len(), 3);
        assert_eq!(discovery.failures.len(), 1);
        assert_eq!(discovery.requests, 3);
        assert!(discovery.items.iter().all(|i| i.category_hint.as_deref() == Some("racing")));
    }

    #[tokio::test]
    async fn max_pages_bounds_the_walk() {
        let fetch = ScriptedFetch::new()
            .ok("https://games.example.com/c/io?page=1", &page_with_links(2))
            .ok("https://games.example.com/c/io?page=2", &page_with_links(2))
            .ok("https://games.example.com/c/io?page=3", &page_with_links(2));
        let adapter = adapter(&["io"], 2);

        let discovery = adapter.discover(&fetch).await.unwrap();
        assert_eq!(discovery.requests, 2);
        assert_eq!(discovery.items.len(), 4);
    }

    #[test]
    fn extract_resolves_relative_links() {
        let adapter = adapter(&["puzzle"], 1);
        let items = adapter.extract(
            r#"<a href="/game/maze-mind/">Maze Mind</a>
               <a href="https://other.example.net/game/full/">Full URL</a>"#,
            "puzzle",
        );
        assert_eq!(items[0].url, "https://games.example.com/game/maze-mind/");
        assert_eq!(items[1].url, "https://other.example.net/game/full/");
    }

    #[test]
    fn pattern_without_captures_is_rejected() {
        let result = CategoryPagesAdapter::with_pattern(
            "x",
            "https://games.example.com/c/{category}?page={page}",
            vec![],
            1,
            r#"<a href="([^"]+)">"#,
        );
        assert!(result.is_err());
    }
}
