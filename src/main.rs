//! Portal-Scout main entry point
//!
//! This is the command-line interface for the Portal-Scout crawler.

use anyhow::{bail, Context};
use clap::Parser;
use portal_scout::config::{load_config_with_hash, validate, Config};
use portal_scout::crawler::{CrawlReport, Crawler};
use portal_scout::fetcher::FetchExecutor;
use portal_scout::governor::PolitenessGovernor;
use portal_scout::output::{print_statistics, write_json, CrawlExport, NavigationTree};
use portal_scout::renderer::{HttpRenderer, RendererOptions};
use portal_scout::storage::{open_storage, SessionStatus, SqliteStorage};
use portal_scout::ScoutError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Portal-Scout: a polite government portal crawler
///
/// Portal-Scout maps the navigation structure of a portal breadth-first while
/// respecting robots.txt, crawl delays and request budgets, and fetches
/// individual documents with caching and retries.
#[derive(Parser, Debug)]
#[command(name = "portal-scout")]
#[command(version = "1.0.0")]
#[command(about = "A polite government portal crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "fetch")]
    dry_run: bool,

    /// Fetch and extract a single page instead of crawling
    #[arg(long, value_name = "URL")]
    fetch: Option<String>,

    /// Override the configured start URL
    #[arg(long, value_name = "URL", conflicts_with = "fetch")]
    start_url: Option<String>,

    /// Also write the result as JSON to this path
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(start_url) = cli.start_url {
        config.crawler.start_url = start_url;
        validate(&config).context("invalid --start-url")?;
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(url) = cli.fetch {
        handle_fetch(&config, &url, cli.json.as_deref()).await?;
    } else {
        handle_crawl(&config, &config_hash, cli.json.as_deref()).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("portal_scout=info,warn"),
            1 => EnvFilter::new("portal_scout=debug,info"),
            2 => EnvFilter::new("portal_scout=trace,debug"),
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

fn build_governor(config: &Config) -> anyhow::Result<Arc<PolitenessGovernor>> {
    let governor = PolitenessGovernor::new(
        config.politeness.clone(),
        config.user_agent.header_value(),
    )?;
    Ok(Arc::new(governor))
}

fn renderer_options(config: &Config) -> RendererOptions {
    RendererOptions {
        user_agent: config.user_agent.header_value(),
        headers: vec![
            (
                "Accept-Language".to_string(),
                "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
            ),
            (
                "Accept".to_string(),
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8".to_string(),
            ),
        ],
    }
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    let crawler = &config.crawler;

    println!("=== Portal-Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    if crawler.start_url.is_empty() {
        println!("  Start URL: (not set)");
    } else {
        println!("  Start URL: {}", crawler.start_url);
    }
    println!("  Max depth: {}", crawler.max_depth);
    println!("  Max pages: {}", crawler.max_pages);
    println!("  Follow external links: {}", crawler.follow_external_links);
    println!("  Include assets: {}", crawler.include_assets);
    println!("  Respect robots.txt: {}", crawler.respect_robots_txt);
    println!("  Crawl delay: {}ms", crawler.crawl_delay_ms);
    println!("  Skip patterns: {:?}", crawler.skip_patterns);
    println!("  Include patterns: {:?}", crawler.include_patterns);

    println!("\nPoliteness:");
    println!(
        "  Requests per second: {}",
        config.politeness.requests_per_second
    );
    println!(
        "  Burst: {} per {}ms, then {}ms cooldown",
        config.politeness.burst_size,
        config.politeness.burst_window_ms,
        config.politeness.cooldown_ms
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
    if !crawler.start_url.is_empty() {
        println!("✓ Would start crawling at {}", crawler.start_url);
    }
}

/// Handles the --fetch mode: one fetch executor call
async fn handle_fetch(config: &Config, url: &str, json: Option<&Path>) -> anyhow::Result<()> {
    let storage = Arc::new(open_storage(Path::new(&config.output.database_path))?);
    let purged = storage.purge_expired_cache().await?;
    tracing::debug!("Purged {} expired cache entries", purged);

    let executor = FetchExecutor::new(
        HttpRenderer::new(),
        Arc::clone(&storage),
        build_governor(config)?,
        config.retry.clone(),
        renderer_options(config),
    );

    let result = executor.scrape_page(url, &config.scrape).await;
    executor.close().await?;
    let result = result?;

    match &result.document {
        Some(document) if result.success => {
            println!("Title: {}", document.title);
            println!("URL: {}", document.url);
            println!("Type: {}", document.page_type);
            println!("Pages: {}", document.page_count);
            println!("Language: {}", document.metadata.language.code());
            println!(
                "Content: {} chars, {} links, {} images, {} attachments, {} tables",
                document.content.chars().count(),
                document.links.len(),
                document.images.len(),
                document.attachments.len(),
                document.tables.len()
            );
            println!(
                "Fetched in {}ms ({} retries{})",
                result.execution_time_ms,
                result.retry_count,
                if result.from_cache { ", from cache" } else { "" }
            );
        }
        _ => {
            println!(
                "Fetch failed after {} retries: {}",
                result.retry_count,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if let Some(path) = json {
        write_json(path, &result)?;
    }

    if !result.success {
        bail!("fetching {} failed", url);
    }
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str, json: Option<&Path>) -> anyhow::Result<()> {
    let options = config.crawler.clone();
    if options.start_url.is_empty() {
        bail!("no start-url configured; set [crawler] start-url or pass --start-url");
    }

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let session_id = storage.create_session(&options.start_url, config_hash).await?;
    tracing::info!("Crawl session {} started", session_id);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            ctrl_c.cancel();
        }
    });

    let mut crawler = Crawler::new(HttpRenderer::new(), build_governor(config)?, renderer_options(config));
    let outcome = crawler.run(options, cancel.clone()).await;

    let report = match outcome {
        Ok(report) => report,
        Err(ScoutError::CrawlAborted { source, partial }) => {
            persist(&storage, session_id, &partial, SessionStatus::Failed).await?;
            return Err(anyhow::Error::new(*source).context("crawl aborted"));
        }
        Err(e) => {
            let mut stats = portal_scout::CrawlStats::new();
            stats.finished_at = Some(chrono::Utc::now());
            storage
                .complete_session(session_id, SessionStatus::Failed, &stats)
                .await?;
            return Err(e.into());
        }
    };

    let status = if cancel.is_cancelled() {
        SessionStatus::Cancelled
    } else {
        SessionStatus::Completed
    };
    persist(&storage, session_id, &report, status).await?;

    print_statistics(&report.stats, &report.nodes);
    println!("\n=== Navigation Tree ===\n");
    print!("{}", NavigationTree::from_nodes(&report.nodes).render());

    if let Some(path) = json {
        let export = CrawlExport {
            session_id: Some(session_id),
            stats: &report.stats,
            nodes: &report.nodes,
        };
        write_json(path, &export)?;
    }

    Ok(())
}

async fn persist(
    storage: &SqliteStorage,
    session_id: i64,
    report: &CrawlReport,
    status: SessionStatus,
) -> Result<(), ScoutError> {
    storage.save_nodes(session_id, &report.nodes).await?;
    storage
        .complete_session(session_id, status, &report.stats)
        .await?;

    tracing::info!(
        "Session {} saved as {}: {} nodes, {} URLs left in frontier",
        session_id,
        status.to_db_string(),
        report.nodes.len(),
        report.frontier_remaining
    );
    Ok(())
}
