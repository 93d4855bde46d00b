use std::fs;
use std::path::Path;

use arcade_import::{RunConfig, run};
use arcade_scraper::{
    CandidateItem, Discovery, FetchResponse, HttpFetch, ScrapeError, SourceAdapter,
};
use tempfile::TempDir;

/// Adapter double that returns a fixed set of items without touching the
/// network.
struct StaticAdapter {
    source: String,
    items: Vec<CandidateItem>,
    fail: bool,
}

impl StaticAdapter {
    fn new(source: &str, items: Vec<CandidateItem>) -> Self {
        Self {
            source: source.to_string(),
            items,
            fail: false,
        }
    }

    fn failing(source: &str) -> Self {
        Self {
            source: source.to_string(),
            items: vec![],
            fail: true,
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for StaticAdapter {
    fn name(&self) -> &str {
        "static"
    }

    fn source(&self) -> &str {
        &self.source
    }

    async fn discover(&self, _fetch: &dyn HttpFetch) -> Result<Discovery, ScrapeError> {
        if self.fail {
            return Err(ScrapeError::Feed("upstream fell over".to_string()));
        }
        Ok(Discovery {
            items: self.items.clone(),
            requests: 1,
            failures: vec![],
        })
    }
}

/// Fetch double for adapters that never fetch.
struct NoFetch;

#[async_trait::async_trait]
impl HttpFetch for NoFetch {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, ScrapeError> {
        Err(ScrapeError::Status {
            status: 404,
            url: url.to_string(),
        })
    }
}

fn item(title: &str, url: &str) -> CandidateItem {
    CandidateItem {
        title: title.to_string(),
        url: url.to_string(),
        source: "feed".to_string(),
        ..Default::default()
    }
}

fn three_items() -> Vec<CandidateItem> {
    vec![
        item("Bubble Pop", "https://games.example.com/play/bubble-pop/"),
        item("Night Racer", "https://games.example.com/play/night-racer/"),
        item("Maze Mind", "https://games.example.com/play/maze-mind/"),
    ]
}

fn config_in(tmp: &TempDir) -> RunConfig {
    RunConfig {
        catalog_path: tmp.path().join("catalog.json"),
        backup_dir: tmp.path().join("backups"),
        report_dir: tmp.path().join("reports"),
        ..RunConfig::default()
    }
}

fn catalog_games(path: &Path) -> serde_json::Value {
    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    doc["games"].clone()
}

#[tokio::test]
async fn fresh_catalog_merges_all_unique_items() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(&tmp);
    let adapters: Vec<Box<dyn SourceAdapter>> =
        vec![Box::new(StaticAdapter::new("feed", three_items()))];

    let report = run(&config, &adapters, &NoFetch).await.unwrap();
    assert_eq!(report.discovered, 3);
    assert_eq!(report.normalized, 3);
    assert_eq!(report.merged, 3);
    assert_eq!(report.total_duplicates(), 0);

    let games = catalog_games(&config.catalog_path);
    assert_eq!(games.as_array().unwrap().len(), 3);
    assert_eq!(games[0]["title"], "Bubble Pop");
}

#[tokio::test]
async fn second_run_of_unchanged_sources_merges_nothing() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(&tmp);
    let adapters: Vec<Box<dyn SourceAdapter>> =
        vec![Box::new(StaticAdapter::new("feed", three_items()))];

    let first = run(&config, &adapters, &NoFetch).await.unwrap();
    assert_eq!(first.merged, 3);

    let second = run(&config, &adapters, &NoFetch).await.unwrap();
    assert_eq!(second.merged, 0);
    assert_eq!(second.total_duplicates(), 3);

    let games = catalog_games(&config.catalog_path);
    assert_eq!(games.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn merge_is_append_only() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(&tmp);

    let first_batch: Vec<Box<dyn SourceAdapter>> =
        vec![Box::new(StaticAdapter::new("feed", three_items()))];
    run(&config, &first_batch, &NoFetch).await.unwrap();
    let before = catalog_games(&config.catalog_path);

    let second_batch: Vec<Box<dyn SourceAdapter>> = vec![Box::new(StaticAdapter::new(
        "feed",
        vec![item("Tower Siege", "https://games.example.com/play/tower-siege/")],
    ))];
    run(&config, &second_batch, &NoFetch).await.unwrap();
    let after = catalog_games(&config.catalog_path);

    // Every pre-existing record is still there, identical, in order.
    let before_games = before.as_array().unwrap();
    let after_games = after.as_array().unwrap();
    assert_eq!(after_games.len(), before_games.len() + 1);
    for (i, old) in before_games.iter().enumerate() {
        assert_eq!(&after_games[i], old);
    }
    assert_eq!(after_games[3]["title"], "Tower Siege");
}

#[tokio::test]
async fn failed_adapter_does_not_stop_siblings() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(&tmp);
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(StaticAdapter::failing("deadfeed")),
        Box::new(StaticAdapter::new("feed", three_items())),
    ];

    let report = run(&config, &adapters, &NoFetch).await.unwrap();
    assert_eq!(report.merged, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, "deadfeed");
}

#[tokio::test]
async fn write_failure_leaves_catalog_untouched_and_errors() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(&tmp);

    // Seed the catalog.
    let seed: Vec<Box<dyn SourceAdapter>> = vec![Box::new(StaticAdapter::new(
        "feed",
        vec![item("Bubble Pop", "https://games.example.com/play/bubble-pop/")],
    ))];
    run(&config, &seed, &NoFetch).await.unwrap();
    let before = fs::read_to_string(&config.catalog_path).unwrap();

    // Sabotage the atomic-write staging path.
    fs::create_dir(tmp.path().join("catalog.json.tmp")).unwrap();

    let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(StaticAdapter::new(
        "feed",
        vec![item("Night Racer", "https://games.example.com/play/night-racer/")],
    ))];
    let result = run(&config, &adapters, &NoFetch).await;
    assert!(result.is_err());

    // Catalog bytes unchanged; backup exists as the recovery point.
    let after = fs::read_to_string(&config.catalog_path).unwrap();
    assert_eq!(before, after);
    assert!(fs::read_dir(&config.backup_dir).unwrap().count() >= 1);
}

#[tokio::test]
async fn backup_retention_bound_holds_over_many_runs() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_in(&tmp);
    config.backup_retention = 3;

    for i in 0..6 {
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(StaticAdapter::new(
            "feed",
            vec![item(
                &format!("Game {i}"),
                &format!("https://games.example.com/play/game-{i}/"),
            )],
        ))];
        run(&config, &adapters, &NoFetch).await.unwrap();
        // Distinct mtimes for deterministic retention ordering.
        std::thread::sleep(std::time::Duration::from_millis(20));
    }

    let backups: Vec<_> = fs::read_dir(&config.backup_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert!(backups.len() <= 3, "expected at most 3 backups, found {}", backups.len());
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_in(&tmp);
    config.dry_run = true;
    let adapters: Vec<Box<dyn SourceAdapter>> =
        vec![Box::new(StaticAdapter::new("feed", three_items()))];

    let report = run(&config, &adapters, &NoFetch).await.unwrap();
    assert_eq!(report.merged, 0);
    assert_eq!(report.normalized, 3);
    assert!(!config.catalog_path.exists());
    assert!(!config.backup_dir.exists());
}

#[tokio::test]
async fn max_records_caps_the_merge() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_in(&tmp);
    config.max_records = 2;
    let adapters: Vec<Box<dyn SourceAdapter>> =
        vec![Box::new(StaticAdapter::new("feed", three_items()))];

    let report = run(&config, &adapters, &NoFetch).await.unwrap();
    assert_eq!(report.merged, 2);
    assert_eq!(catalog_games(&config.catalog_path).as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unusable_items_are_counted_as_skipped() {
    let tmp = TempDir::new().unwrap();
    let config = config_in(&tmp);
    let mut items = three_items();
    items.push(item("", "https://games.example.com/play/untitled/"));

    let adapters: Vec<Box<dyn SourceAdapter>> =
        vec![Box::new(StaticAdapter::new("feed", items))];
    let report = run(&config, &adapters, &NoFetch).await.unwrap();
    assert_eq!(report.discovered, 4);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.merged, 3);
}
