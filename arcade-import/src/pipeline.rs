//! Run orchestration.
//!
//! Adapters are invoked strictly one at a time; within each adapter every
//! fetch is paced by the client. One adapter failing is logged and its
//! siblings continue; only the final catalog write is all-or-nothing.

use arcade_catalog::{BackupManager, CatalogError, CatalogStore, GameRecord};
use arcade_scraper::{
    CategoryPagesAdapter, FeedAdapter, HttpFetch, ScrapeError, SearchAdapter, SourceAdapter,
    SourceFailure,
};

use crate::config::RunConfig;
use crate::dedup;
use crate::normalize::{SourceContext, normalize};
use crate::report::{RunLog, RunReport};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Source configuration error: {0}")]
    Source(#[from] ScrapeError),
}

/// Build the adapter set the configuration asks for.
pub fn build_adapters(config: &RunConfig) -> Result<Vec<Box<dyn SourceAdapter>>, ImportError> {
    let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::new();

    if let Some(ref feed_url) = config.feed_url {
        adapters.push(Box::new(FeedAdapter::new("feed", feed_url.clone())));
    }
    if let Some(ref page_url) = config.page_url {
        adapters.push(Box::new(CategoryPagesAdapter::new(
            "listing",
            page_url.clone(),
            config.categories.clone(),
            config.max_pages,
        )?));
    }
    if let Some(ref search_url) = config.search_url {
        adapters.push(Box::new(SearchAdapter::new(
            "search",
            search_url.clone(),
            config.terms.clone(),
        )));
    }

    Ok(adapters)
}

/// Execute a full ingestion run: discover, normalize, deduplicate, merge.
///
/// Recoverable failures (a dead feed, a failed page, an unparseable item)
/// are absorbed into the report; the returned error means the run could
/// not commit - the catalog on disk is unchanged and the last backup is
/// the recovery point.
pub async fn run(
    config: &RunConfig,
    adapters: &[Box<dyn SourceAdapter>],
    fetch: &dyn HttpFetch,
) -> Result<RunReport, ImportError> {
    let mut report = RunReport::new();
    let mut log = RunLog::new();

    let store = CatalogStore::new(&config.catalog_path);
    let existing = store.load();
    log.info(format!(
        "Catalog loaded: {} existing records from {}",
        existing.len(),
        config.catalog_path.display()
    ));

    if adapters.is_empty() {
        log.warn("No sources configured; nothing to discover");
    }

    // Discovery: adapters run sequentially, each through the paced fetch
    // client. A failed adapter is reported and the rest continue.
    let mut items = Vec::new();
    for adapter in adapters {
        log.info(format!(
            "Running {} adapter (source '{}')",
            adapter.name(),
            adapter.source()
        ));
        match adapter.discover(fetch).await {
            Ok(discovery) => {
                log.info(format!(
                    "{}: {} items from {} requests ({} failed)",
                    adapter.name(),
                    discovery.items.len(),
                    discovery.requests,
                    discovery.failures.len()
                ));
                report.absorb_discovery(&discovery);
                items.extend(discovery.items);
            }
            Err(e) => {
                log.error(format!("{} adapter failed: {}", adapter.name(), e));
                report.requests += 1;
                report.failures.push(SourceFailure {
                    source: adapter.source().to_string(),
                    target: adapter.name().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    // Normalization: per-item granularity, unusable items are skipped and
    // counted, never fatal.
    let mut normalized: Vec<GameRecord> = Vec::new();
    for item in &items {
        let ctx = SourceContext::new(
            item.source.clone(),
            &config.embed_template,
            &config.thumbnail_template,
        );
        match normalize(item, &ctx) {
            Some(record) => normalized.push(record),
            None => {
                report.skipped += 1;
                log.warn(format!(
                    "Skipped unusable item from '{}' ({})",
                    item.source,
                    if item.title.trim().is_empty() {
                        "no title"
                    } else {
                        "no link"
                    }
                ));
            }
        }
    }
    report.normalized = normalized.len();

    // Deduplication against the existing catalog and within this batch.
    let mut partition = dedup::partition(&existing, normalized);
    report.absorb_partition(&partition);
    log.info(format!(
        "Partitioned: {} unique, {} duplicates",
        partition.unique.len(),
        partition.duplicates.len()
    ));

    if partition.unique.len() > config.max_records {
        log.warn(format!(
            "Capping merge at {} records ({} discovered unique)",
            config.max_records,
            partition.unique.len()
        ));
        partition.unique.truncate(config.max_records);
    }

    if config.dry_run {
        log.info("Dry run: skipping merge and backup");
        finish(&log, &report, config);
        return Ok(report);
    }

    if partition.unique.is_empty() {
        log.info("No new records to merge");
        finish(&log, &report, config);
        return Ok(report);
    }

    match merge_and_persist(config, &store, &existing, &partition.unique) {
        Ok(()) => {
            report.merged = partition.unique.len();
            log.success(format!(
                "Merged {} new records; catalog now has {}",
                report.merged,
                existing.len() + report.merged
            ));
        }
        Err(e) => {
            log.error(format!("Merge failed, catalog left untouched: {}", e));
            finish(&log, &report, config);
            return Err(e);
        }
    }

    finish(&log, &report, config);
    Ok(report)
}

/// Commit the run: snapshot, append, atomic write, prune.
///
/// Each step is a hard precondition for the next. A snapshot failure
/// aborts before anything is written; a write failure leaves the previous
/// catalog file in place with the fresh backup as recovery point.
fn merge_and_persist(
    config: &RunConfig,
    store: &CatalogStore,
    existing: &[GameRecord],
    unique: &[GameRecord],
) -> Result<(), ImportError> {
    let backup = BackupManager::new(&config.backup_dir, config.backup_retention);
    backup.snapshot(store.path())?;

    // Append only: existing records keep their order and content.
    let mut merged = existing.to_vec();
    merged.extend(unique.iter().cloned());

    store.save(&merged)?;
    backup.prune();
    Ok(())
}

/// Emit the summary and write the report file. Never fails the run.
fn finish(log: &RunLog, report: &RunReport, config: &RunConfig) {
    for line in RunLog::render_summary(report).lines() {
        log::info!("{}", line);
    }
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let path = config.report_dir.join(format!("run-{stamp}.log"));
    log.write_to_file(&path, report);
}
