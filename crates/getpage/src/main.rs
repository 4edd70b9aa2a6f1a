//! getpage - fetch a web page through a Redis-backed cache

use anyhow::{Context, Result};
use clap::Parser;
use pagecache::{CachedFetcher, HttpFetcher};
use pagestore::RespStore;
use tracing::{debug, info};

/// Slow-response endpoint used when no URL is given
const DEMO_URL: &str = "http://slowwly.robertomurray.co.uk";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page to fetch
    #[arg(default_value = DEMO_URL)]
    url: String,

    /// Key-value store address (host:port or redis://host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    store: String,

    /// Check that the store answers PING, print OK or FAILED, and exit
    #[arg(long)]
    health: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr; the page body is never printed
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    if args.health {
        match RespStore::connect(&args.store).and_then(|mut store| store.ping()) {
            Ok(()) => {
                println!("OK");
                std::process::exit(0);
            }
            Err(e) => {
                debug!("Health check failed: {}", e);
                eprintln!("FAILED");
                std::process::exit(1);
            }
        }
    }

    info!("getpage v{}", env!("CARGO_PKG_VERSION"));

    let store = RespStore::connect(&args.store)
        .with_context(|| format!("Failed to connect to store at {}", args.store))?;
    let fetcher = HttpFetcher::new().context("Failed to build HTTP client")?;
    let mut pages = CachedFetcher::new(store, fetcher);

    let body = pages
        .fetch_with_cache(&args.url)
        .with_context(|| format!("Failed to get {}", args.url))?;
    let stats = pages.stats();
    info!(
        "Got {} bytes for {} (hits: {}, misses: {}, hit ratio: {:.2})",
        body.len(),
        args.url,
        stats.hits,
        stats.misses,
        stats.hit_ratio()
    );

    let (store, _) = pages.into_inner();
    store.close().context("Failed to disconnect from store")?;
    Ok(())
}
