//! Wapper main entry point
//!
//! This is the command-line interface for the wapper website mirror.

use anyhow::Context;
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wapper::config::CrawlConfig;
use wapper::crawler::run_crawl;
use wapper::storage::AssetKind;
use wapper::url::ScopeMode;

/// Wapper: website mirroring + source extraction
///
/// Wapper crawls a website from a seed URL, saves pages and assets into a
/// browsable local tree, rewrites intra-site links for offline use, and
/// records structural metadata into JSONL logs under _meta/.
#[derive(Parser, Debug)]
#[command(name = "wapper")]
#[command(version = "0.1.0")]
#[command(about = "Website mirroring + source extraction", long_about = None)]
struct Cli {
    /// Start URL to crawl
    #[arg(value_name = "URL")]
    url: String,

    /// Output root folder
    #[arg(long, default_value = "./out")]
    result: PathBuf,

    /// Maximum number of pages to crawl
    #[arg(long, default_value_t = 200)]
    max_pages: usize,

    /// Scope rule (same-origin|same-host|all)
    #[arg(long, default_value = "same-origin")]
    scope: String,

    /// Comma list of asset kinds to follow: js,css,img,font,misc
    #[arg(long, default_value = "js,css,img,font")]
    include_assets: String,

    /// Respect robots.txt (reserved)
    #[arg(long)]
    respect_robots: bool,

    /// Maximum crawl depth
    #[arg(long, default_value_t = 3)]
    depth: u32,

    /// Concurrent requests per wave
    #[arg(long, default_value_t = 10)]
    concurrency: usize,

    /// Rate limit, like "5" or "5rps"
    #[arg(long, default_value = "5rps")]
    rate: String,

    /// Do not rewrite links for offline browsing
    #[arg(long)]
    no_rewrite_links: bool,

    /// Store raw response bodies for debugging
    #[arg(long)]
    store_raw: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    let summary = run_crawl(config).await.context("crawl failed")?;

    tracing::info!(
        "Mirror completed: visited={} saved_pages={} saved_assets={} output_root={}",
        summary.visited,
        summary.saved_pages,
        summary.saved_assets,
        summary.output_root
    );

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wapper=info,warn"),
            1 => EnvFilter::new("wapper=debug,info"),
            2 => EnvFilter::new("wapper=trace,debug"),
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

/// Maps CLI options onto the crawl configuration
fn build_config(cli: &Cli) -> anyhow::Result<CrawlConfig> {
    let scope: ScopeMode = cli
        .scope
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let include_assets = parse_include_assets(&cli.include_assets)?;
    let rate_rps = parse_rate(&cli.rate)?;

    Ok(CrawlConfig {
        seed_url: cli.url.clone(),
        output_root: cli.result.clone(),
        max_pages: cli.max_pages,
        scope,
        include_assets,
        respect_robots: cli.respect_robots,
        max_depth: cli.depth,
        concurrency: cli.concurrency,
        rate_rps,
        rewrite_links: !cli.no_rewrite_links,
        store_raw: cli.store_raw,
    })
}

/// Parses a comma-separated list of asset kinds, ignoring blanks
fn parse_include_assets(input: &str) -> anyhow::Result<HashSet<AssetKind>> {
    let mut kinds = HashSet::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let kind: AssetKind = part.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        kinds.insert(kind);
    }
    Ok(kinds)
}

/// Parses a rate like "5" or "5rps" into requests per second
fn parse_rate(input: &str) -> anyhow::Result<f64> {
    let digits = input.trim().trim_end_matches("rps");
    let digits = if digits.is_empty() { "5" } else { digits };
    digits
        .parse::<f64>()
        .with_context(|| format!("invalid rate '{}'", input))
}
