use anyhow::{anyhow, Result};
use clap::Parser;
use scour_core::config::EngineConfig;
use scour_core::crawler::Crawler;
use scour_core::fetch::{Fetcher, HttpFetcher};
use scour_core::manager::IndexManager;
use scour_core::updater::RealtimeUpdater;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "scour-crawl")]
#[command(about = "Crawl the web into a scour index directory")]
struct Cli {
    /// Path to a file with seed URLs (one per line)
    #[arg(long)]
    seeds: String,
    /// Output index directory
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    /// Optional JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Maximum number of pages to fetch
    #[arg(long)]
    max_pages: Option<usize>,
    /// Worker pool size (0 = one per core)
    #[arg(long)]
    workers: Option<usize>,
    /// Request timeout seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// User-Agent string for crawling
    #[arg(long)]
    user_agent: Option<String>,
    /// Only follow links that remain on the same host as the page
    #[arg(long)]
    same_host_only: bool,
    /// Maximum pages admitted to the frontier per host (0 = unlimited)
    #[arg(long)]
    max_per_host: Option<usize>,
}

fn read_seeds(path: &str) -> Result<Vec<String>> {
    let mut seeds = Vec::new();
    for line in BufReader::new(File::open(path)?).lines() {
        let s = line?.trim().to_string();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        seeds.push(s);
    }
    Ok(seeds)
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    config.index_dir = args.index;
    if let Some(v) = args.max_pages {
        config.crawl.max_pages = v;
    }
    if let Some(v) = args.workers {
        config.crawl.workers = v;
    }
    if let Some(v) = args.timeout_secs {
        config.crawl.timeout_secs = v;
    }
    if let Some(v) = args.user_agent {
        config.crawl.user_agent = v;
    }
    if args.same_host_only {
        config.crawl.same_host_only = true;
    }
    if let Some(v) = args.max_per_host {
        config.crawl.max_per_host = v;
    }

    let seeds = read_seeds(&args.seeds)?;
    if seeds.is_empty() {
        return Err(anyhow!("no seeds in {}", args.seeds));
    }

    let manager = Arc::new(IndexManager::new(&config.index_dir));
    if manager.has_saved_index() {
        manager.load()?;
        tracing::info!(
            documents = manager.document_count(),
            "extending existing index"
        );
    }

    let updater = RealtimeUpdater::start(Arc::clone(&manager), config.queue_capacity);
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.crawl)?);
    let crawler = Arc::new(Crawler::new(fetcher, updater.sender(), config.crawl));

    let stats = crawler.run(seeds).await?;
    updater.stop().await;
    manager.save()?;

    tracing::info!(
        fetched = stats.fetched,
        indexed = stats.indexed,
        discovered = stats.discovered,
        documents = manager.document_count(),
        index_dir = %config.index_dir.display(),
        "crawl complete, index saved"
    );
    Ok(())
}
