//! Run configuration.
//!
//! A [`RunConfig`] is constructed once at startup and passed by reference
//! into every component; there is no module-level mutable configuration.
//! Values cascade: defaults, then the TOML config file under
//! `dirs::config_dir()/arcade/config.toml`, then `ARCADE_*` environment
//! variables. CLI flags are applied on top by the caller.

use std::path::PathBuf;
use std::time::Duration;

/// Everything an ingestion run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Catalog document location.
    pub catalog_path: PathBuf,
    /// Directory for timestamped catalog backups.
    pub backup_dir: PathBuf,
    /// Directory for run report logs.
    pub report_dir: PathBuf,
    /// Maximum number of new records merged per run.
    pub max_records: usize,
    /// Minimum spacing between consecutive requests.
    pub delay_ms: u64,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Maximum attempts per request for transient failures.
    pub max_attempts: u32,
    /// How many backups to keep.
    pub backup_retention: usize,
    /// RSS feed to poll, when set.
    pub feed_url: Option<String>,
    /// Category listing URL template (`{category}`, `{page}`), when set.
    pub page_url: Option<String>,
    /// Categories to walk through `page_url`.
    pub categories: Vec<String>,
    /// Pagination bound per category.
    pub max_pages: u32,
    /// Search endpoint URL template (`{query}`), when set.
    pub search_url: Option<String>,
    /// Search terms to issue.
    pub terms: Vec<String>,
    /// Embed URL template (`{id}`) for records without an explicit embed.
    pub embed_template: String,
    /// Thumbnail URL template (`{id}`) for records without one.
    pub thumbnail_template: String,
    /// Discover and classify, but write nothing.
    pub dry_run: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("data/catalog.json"),
            backup_dir: PathBuf::from("data/backups"),
            report_dir: PathBuf::from("data/reports"),
            max_records: 60,
            delay_ms: 1000,
            timeout_secs: 15,
            max_attempts: 3,
            backup_retention: 10,
            feed_url: None,
            page_url: None,
            categories: vec![
                "action".to_string(),
                "puzzle".to_string(),
                "racing".to_string(),
                "sports".to_string(),
                "io".to_string(),
            ],
            max_pages: 5,
            search_url: None,
            terms: Vec::new(),
            embed_template: "https://games.example.com/embed/{id}/".to_string(),
            thumbnail_template: "https://games.example.com/thumbs/{id}.jpg".to_string(),
            dry_run: false,
        }
    }
}

impl RunConfig {
    /// Build the effective configuration from defaults, the config file,
    /// and environment variables, in that order.
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(file) = load_config_file() {
            config.apply_file(file);
        }
        config.apply_env();
        config
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn apply_file(&mut self, file: IngestConfig) {
        if let Some(v) = file.catalog_path {
            self.catalog_path = PathBuf::from(v);
        }
        if let Some(v) = file.backup_dir {
            self.backup_dir = PathBuf::from(v);
        }
        if let Some(v) = file.report_dir {
            self.report_dir = PathBuf::from(v);
        }
        if let Some(v) = file.max_records {
            self.max_records = v;
        }
        if let Some(v) = file.delay_ms {
            self.delay_ms = v;
        }
        if let Some(v) = file.timeout_secs {
            self.timeout_secs = v;
        }
        if let Some(v) = file.max_attempts {
            self.max_attempts = v;
        }
        if let Some(v) = file.backup_retention {
            self.backup_retention = v;
        }
        if file.feed_url.is_some() {
            self.feed_url = file.feed_url;
        }
        if file.page_url.is_some() {
            self.page_url = file.page_url;
        }
        if let Some(v) = file.categories {
            self.categories = v;
        }
        if let Some(v) = file.max_pages {
            self.max_pages = v;
        }
        if file.search_url.is_some() {
            self.search_url = file.search_url;
        }
        if let Some(v) = file.terms {
            self.terms = v;
        }
        if let Some(v) = file.embed_template {
            self.embed_template = v;
        }
        if let Some(v) = file.thumbnail_template {
            self.thumbnail_template = v;
        }
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("ARCADE_CATALOG") {
            self.catalog_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ARCADE_BACKUP_DIR") {
            self.backup_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ARCADE_REPORT_DIR") {
            self.report_dir = PathBuf::from(v);
        }
        if let Some(v) = env_parse("ARCADE_MAX_RECORDS") {
            self.max_records = v;
        }
        if let Some(v) = env_parse("ARCADE_DELAY_MS") {
            self.delay_ms = v;
        }
        if let Some(v) = env_parse("ARCADE_TIMEOUT_SECS") {
            self.timeout_secs = v;
        }
        if let Some(v) = env_parse("ARCADE_RETRIES") {
            self.max_attempts = v;
        }
        if let Some(v) = env_parse("ARCADE_BACKUP_RETENTION") {
            self.backup_retention = v;
        }
        if let Ok(v) = std::env::var("ARCADE_FEED_URL") {
            self.feed_url = Some(v);
        }
        if let Ok(v) = std::env::var("ARCADE_PAGE_URL") {
            self.page_url = Some(v);
        }
        if let Ok(v) = std::env::var("ARCADE_SEARCH_URL") {
            self.search_url = Some(v);
        }
        if let Ok(v) = std::env::var("ARCADE_CATEGORIES") {
            self.categories = split_list(&v);
        }
        if let Ok(v) = std::env::var("ARCADE_TERMS") {
            self.terms = split_list(&v);
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring unparseable {}={}", name, raw);
            None
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// TOML config file format.
#[derive(Debug, serde::Deserialize)]
struct ConfigFile {
    ingest: Option<IngestConfig>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct IngestConfig {
    catalog_path: Option<String>,
    backup_dir: Option<String>,
    report_dir: Option<String>,
    max_records: Option<usize>,
    delay_ms: Option<u64>,
    timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
    backup_retention: Option<usize>,
    feed_url: Option<String>,
    page_url: Option<String>,
    categories: Option<Vec<String>>,
    max_pages: Option<u32>,
    search_url: Option<String>,
    terms: Option<Vec<String>>,
    embed_template: Option<String>,
    thumbnail_template: Option<String>,
}

/// Return the path to the config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("arcade").join("config.toml"))
}

fn load_config_file() -> Option<IngestConfig> {
    let path = config_path()?;
    let content = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => file.ingest,
        Err(e) => {
            log::warn!("Ignoring unparseable config file {}: {}", path.display(), e);
            None
        }
    }
}
