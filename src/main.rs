//! Shelf-Scout main entry point
//!
//! This is the command-line interface for running one product search.

use anyhow::Context;
use clap::Parser;
use shelf_scout::config::{load_config_with_hash, Config};
use shelf_scout::output::{print_report, HttpCollector, JsonFileSink};
use shelf_scout::page::build_http_client;
use shelf_scout::{run_search, HttpPage, RunOptions, ScoutError, SearchRequest, SiteRegistry};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Shelf-Scout: product search and extraction for shopping sites
///
/// Shelf-Scout opens a supported shop, searches it, extracts every product
/// on the results listing and posts the ones matching the query to a
/// collector service.
#[derive(Parser, Debug)]
#[command(name = "shelf-scout")]
#[command(version)]
#[command(about = "Search a shop and collect matching products", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Site to search (e.g. amazon.ca)
    #[arg(long)]
    site: String,

    /// Search text; every word must appear in a product's name
    #[arg(long)]
    query: String,

    /// Collector route the results are posted to (e.g. /results)
    #[arg(long)]
    route: String,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the planned search without running it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let request = SearchRequest::parse(&cli.site, &cli.query, &cli.route)?;
    let registry = SiteRegistry::builtin();

    if cli.dry_run {
        handle_dry_run(&config, &registry, &request)
    } else {
        handle_search(config, &registry, &request, cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_scout=info,warn"),
            1 => EnvFilter::new("shelf_scout=debug,info"),
            2 => EnvFilter::new("shelf_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the planned search
fn handle_dry_run(
    config: &Config,
    registry: &SiteRegistry,
    request: &SearchRequest,
) -> anyhow::Result<()> {
    let adapter = registry.resolve(request.site)?;
    let selectors = adapter.selectors();

    println!("=== Shelf-Scout Dry Run ===\n");

    println!("Search:");
    println!("  Site: {} ({})", request.site, adapter.home_url());
    println!("  Query: {}", request.query);
    println!("  Words: {}", request.words().join(", "));
    println!("  Route: {}", request.response_route);

    println!("\nSelectors:");
    println!("  Search field: {}", selectors.search_field);
    println!("  Search button: {}", selectors.search_button);
    println!("  Product container: {}", selectors.product_container);

    println!("\nBrowser:");
    println!("  Navigation timeout: {}ms", config.browser.navigation_timeout_ms);
    println!("  Selector timeout: {}ms", config.browser.selector_timeout_ms);
    println!("  Load timeout: {}ms", config.browser.load_timeout_ms);
    println!(
        "  Max concurrent extractions: {}",
        config.extraction.max_concurrency
    );

    println!("\nCollector:");
    println!(
        "  Endpoint: {}{}",
        config.collector.base_url.trim_end_matches('/'),
        request.response_route
    );
    if let Some(path) = &config.collector.results_path {
        println!("  Results file: {}", path);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would search {} for '{}'", request.site, request.query);

    Ok(())
}

/// Handles the main search operation
async fn handle_search(
    config: Config,
    registry: &SiteRegistry,
    request: &SearchRequest,
    quiet: bool,
) -> anyhow::Result<()> {
    let client = build_http_client(&config.user_agent).context("Failed to build HTTP client")?;
    let page = HttpPage::new(client.clone(), config.browser.navigation_timeout());
    let collector = HttpCollector::new(client, &config.collector.base_url);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling outstanding extractions");
            on_interrupt.cancel();
        }
    });

    let mut options = RunOptions::from_config(&config);
    options.extraction = options.extraction.with_cancel(cancel);

    let report = match run_search(request, registry, &page, &collector, &options).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Search failed: {}", e);
            return Err(e).context("Search request aborted");
        }
    };

    if let Some(path) = &config.collector.results_path {
        JsonFileSink::new(path)
            .save(&report.batch.products)
            .with_context(|| format!("Failed to write results to {}", path))?;
    }

    if !quiet {
        print_report(&report);
    }

    report
        .delivery
        .map(|_| ())
        .map_err(ScoutError::from)
        .context("Results were extracted but not delivered")
}
