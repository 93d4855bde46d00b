use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::error::ScrapeError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Tunables for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Minimum spacing between consecutive requests. Politeness toward
    /// rate-limited upstream sites; never parallelized away.
    pub min_interval: Duration,
    /// Maximum attempts for transient failures (timeouts, connection
    /// errors). 1 means no retries.
    pub max_attempts: u32,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            min_interval: Duration::from_millis(1000),
            max_attempts: 3,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// A fetched response, returned even for access-denied pages.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

/// Retry state machine: attempt count and the backoff delay before the
/// next attempt. Kept separate from the fetch loop so the schedule is
/// testable on its own.
#[derive(Debug, Clone)]
pub struct Backoff {
    attempt: u32,
    max_attempts: u32,
    base: Duration,
}

impl Backoff {
    pub fn new(max_attempts: u32, base: Duration) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            base,
        }
    }

    /// Record a failed attempt. Returns the delay to wait before retrying,
    /// or `None` when attempts are exhausted. Delays double each time:
    /// base, 2*base, 4*base, ...
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return None;
        }
        Some(self.base * 2u32.saturating_pow(self.attempt - 1))
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// The seam adapters fetch through. Implemented by [`RateLimitedClient`]
/// for real runs and by scripted fakes in tests.
#[async_trait::async_trait]
pub trait HttpFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, ScrapeError>;
}

/// HTTP client with request pacing, browser-like headers, and retry on
/// transient failures.
pub struct RateLimitedClient {
    http: reqwest::Client,
    options: FetchOptions,
    last_request: Arc<Mutex<Instant>>,
}

impl RateLimitedClient {
    pub fn new(options: FetchOptions) -> Result<Self, ScrapeError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
        );

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            options: options.clone(),
            last_request: Arc::new(Mutex::new(Instant::now() - options.min_interval)),
        })
    }

    /// Wait until at least `min_interval` has passed since the previous
    /// request, then claim the slot.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.options.min_interval {
            tokio::time::sleep(self.options.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchResponse, ScrapeError> {
        let resp = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::Timeout {
                    url: url.to_string(),
                }
            } else {
                ScrapeError::Http(e)
            }
        })?;

        let status = resp.status().as_u16();
        let headers: HashMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();

        // 403 pages still go back to the caller: anti-bot interstitials
        // sometimes carry usable listing content.
        if !(200..300).contains(&status) && status != 403 {
            return Err(ScrapeError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = resp.text().await?;
        Ok(FetchResponse {
            status,
            body,
            headers,
        })
    }
}

#[async_trait::async_trait]
impl HttpFetch for RateLimitedClient {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, ScrapeError> {
        let mut backoff = Backoff::new(self.options.max_attempts, Duration::from_millis(500));

        loop {
            self.pace().await;

            match self.fetch_once(url).await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_transient() => match backoff.next_delay() {
                    Some(delay) => {
                        log::warn!(
                            "Attempt {} for {} failed ({}); retrying in {:?}",
                            backoff.attempt(),
                            url,
                            e,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        log::error!("Giving up on {} after {} attempts: {}", url, backoff.attempt(), e);
                        return Err(e);
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_exhausted() {
        let mut backoff = Backoff::new(4, Duration::from_millis(500));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(500)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(1000)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(2000)));
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.attempt(), 4);
    }

    #[test]
    fn single_attempt_backoff_never_retries() {
        let mut backoff = Backoff::new(1, Duration::from_millis(500));
        assert_eq!(backoff.next_delay(), None);
    }

    #[test]
    fn default_options_are_polite() {
        let options = FetchOptions::default();
        assert!(options.min_interval >= Duration::from_millis(500));
        assert!(options.max_attempts >= 1);
    }
}
