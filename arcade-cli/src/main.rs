//! arcade CLI
//!
//! Operator-facing entry point for the catalog ingestion pipeline.

mod error;

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use arcade_import::RunConfig;
use arcade_scraper::{FetchOptions, RateLimitedClient};

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "arcade")]
#[command(about = "Catalog ingestion pipeline for the arcade site", long_about = None)]
struct Cli {
    /// With no subcommand, a full ingestion run is performed.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover games from the configured sources and merge them into the catalog
    Run {
        /// Catalog file path
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Backup directory
        #[arg(long)]
        backup_dir: Option<PathBuf>,

        /// Run report directory
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Maximum new records merged per run
        #[arg(long)]
        max_records: Option<usize>,

        /// Minimum delay between requests, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Per-request timeout, in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Maximum attempts per request for transient failures
        #[arg(long)]
        retries: Option<u32>,

        /// Number of catalog backups to keep
        #[arg(long)]
        backup_retention: Option<usize>,

        /// RSS feed URL to poll
        #[arg(long)]
        feed_url: Option<String>,

        /// Category listing URL template ({category}, {page})
        #[arg(long)]
        page_url: Option<String>,

        /// Categories to walk (e.g., action,puzzle,io)
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,

        /// Search endpoint URL template ({query})
        #[arg(long)]
        search_url: Option<String>,

        /// Search terms to issue (e.g., "tower defense,kart")
        #[arg(long, value_delimiter = ',')]
        terms: Option<Vec<String>>,

        /// Discover and classify without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Show catalog record counts
    Stats {
        /// Catalog file path
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Inspect the run configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration and where the config file lives
    Show,

    /// Print the config file path
    Path,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => run_ingestion(RunConfig::load()),
        Some(Commands::Run {
            catalog,
            backup_dir,
            report_dir,
            max_records,
            delay_ms,
            timeout_secs,
            retries,
            backup_retention,
            feed_url,
            page_url,
            categories,
            search_url,
            terms,
            dry_run,
        }) => {
            let mut config = RunConfig::load();
            if let Some(v) = catalog {
                config.catalog_path = v;
            }
            if let Some(v) = backup_dir {
                config.backup_dir = v;
            }
            if let Some(v) = report_dir {
                config.report_dir = v;
            }
            if let Some(v) = max_records {
                config.max_records = v;
            }
            if let Some(v) = delay_ms {
                config.delay_ms = v;
            }
            if let Some(v) = timeout_secs {
                config.timeout_secs = v;
            }
            if let Some(v) = retries {
                config.max_attempts = v;
            }
            if let Some(v) = backup_retention {
                config.backup_retention = v;
            }
            if feed_url.is_some() {
                config.feed_url = feed_url;
            }
            if page_url.is_some() {
                config.page_url = page_url;
            }
            if let Some(v) = categories {
                config.categories = v;
            }
            if search_url.is_some() {
                config.search_url = search_url;
            }
            if let Some(v) = terms {
                config.terms = v;
            }
            config.dry_run = dry_run;

            run_ingestion(config)
        }
        Some(Commands::Stats { catalog }) => run_stats(catalog),
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => run_config_show(),
            ConfigAction::Path => run_config_path(),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{} {}",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                e,
            );
            ExitCode::FAILURE
        }
    }
}

/// Run the full ingestion pipeline.
fn run_ingestion(config: RunConfig) -> Result<(), CliError> {
    println!(
        "Catalog:  {}",
        config.catalog_path.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    println!(
        "Backups:  {}",
        config.backup_dir.display().if_supports_color(Stdout, |t| t.dimmed()),
    );
    if config.dry_run {
        println!(
            "{}",
            "Dry run: nothing will be written".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    println!();

    log::info!("Starting ingestion run");
    let adapters = arcade_import::build_adapters(&config).map_err(CliError::Run)?;
    if adapters.is_empty() {
        eprintln!(
            "{} No sources configured.",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
        );
        eprintln!();
        eprintln!("Configure at least one of:");
        eprintln!("  --feed-url <url>              (or ARCADE_FEED_URL)");
        eprintln!("  --page-url <url-template>     (or ARCADE_PAGE_URL)");
        eprintln!("  --search-url <url-template>   (or ARCADE_SEARCH_URL)");
        return Err(CliError::config("no sources configured"));
    }

    let client = RateLimitedClient::new(FetchOptions {
        timeout: config.timeout(),
        min_interval: config.delay(),
        max_attempts: config.max_attempts,
        ..FetchOptions::default()
    })
    .map_err(|e| CliError::config(format!("could not build HTTP client: {e}")))?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("failed to create tokio runtime: {e}")))?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .expect("static template")
            .tick_chars("/-\\|"),
    );
    pb.set_message(format!("Ingesting from {} source(s)...", adapters.len()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let outcome = rt.block_on(arcade_import::run(&config, &adapters, &client));
    pb.finish_and_clear();

    let report = outcome?;

    println!("{}", "Summary:".if_supports_color(Stdout, |t| t.bold()));
    println!(
        "  {} {} requests, {} items discovered",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        report.requests,
        report.discovered,
    );
    println!(
        "  {} {} merged, {} duplicates, {} skipped",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        report.merged,
        report.total_duplicates(),
        report.skipped,
    );
    if !report.failures.is_empty() {
        println!(
            "  {} {} failed requests",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            report.failures.len(),
        );
        for failure in &report.failures {
            println!(
                "    {} [{}] {}: {}",
                "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                failure.source,
                failure.target,
                failure.message,
            );
        }
    }

    Ok(())
}

/// Print catalog record counts, overall and per category.
fn run_stats(catalog: Option<PathBuf>) -> Result<(), CliError> {
    let mut config = RunConfig::load();
    if let Some(v) = catalog {
        config.catalog_path = v;
    }

    let store = arcade_catalog::CatalogStore::new(&config.catalog_path);
    let records = store.load();

    if records.is_empty() {
        println!(
            "{}",
            "Catalog is empty.".if_supports_color(Stdout, |t| t.dimmed()),
        );
        return Ok(());
    }

    let mut by_category: HashMap<&str, usize> = HashMap::new();
    for record in &records {
        *by_category.entry(record.category.as_str()).or_insert(0) += 1;
    }

    println!(
        "{} {} records in {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        records.len(),
        config.catalog_path.display(),
    );
    println!();
    let mut counts: Vec<_> = by_category.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    for (category, count) in counts {
        println!(
            "  {} {}",
            format!("{category}:").if_supports_color(Stdout, |t| t.cyan()),
            count,
        );
    }

    let featured = records.iter().filter(|r| r.featured).count();
    let trending = records.iter().filter(|r| r.trending).count();
    println!();
    println!("  featured: {featured}, trending: {trending}");

    Ok(())
}

/// Show the effective configuration.
fn run_config_show() -> Result<(), CliError> {
    let config = RunConfig::load();

    println!(
        "{}",
        "Arcade Ingestion Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    println!();

    match arcade_import::config::config_path() {
        Some(p) if p.exists() => {
            println!(
                "  Config file: {} {}",
                p.display().if_supports_color(Stdout, |t| t.cyan()),
                "(exists)".if_supports_color(Stdout, |t| t.green()),
            );
        }
        Some(p) => {
            println!(
                "  Config file: {} {}",
                p.display().if_supports_color(Stdout, |t| t.cyan()),
                "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
        None => {
            println!(
                "  Config file: {}",
                "could not determine path".if_supports_color(Stdout, |t| t.red()),
            );
        }
    }
    println!();

    println!("  catalog_path:     {}", config.catalog_path.display());
    println!("  backup_dir:       {}", config.backup_dir.display());
    println!("  report_dir:       {}", config.report_dir.display());
    println!("  max_records:      {}", config.max_records);
    println!("  delay_ms:         {}", config.delay_ms);
    println!("  timeout_secs:     {}", config.timeout_secs);
    println!("  max_attempts:     {}", config.max_attempts);
    println!("  backup_retention: {}", config.backup_retention);
    println!(
        "  feed_url:         {}",
        config.feed_url.as_deref().unwrap_or("(not set)"),
    );
    println!(
        "  page_url:         {}",
        config.page_url.as_deref().unwrap_or("(not set)"),
    );
    println!("  categories:       {}", config.categories.join(", "));
    println!(
        "  search_url:       {}",
        config.search_url.as_deref().unwrap_or("(not set)"),
    );
    println!("  terms:            {}", config.terms.join(", "));

    Ok(())
}

/// Print the config file path.
fn run_config_path() -> Result<(), CliError> {
    match arcade_import::config::config_path() {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => Err(CliError::config("could not determine config directory")),
    }
}
