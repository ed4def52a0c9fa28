use anyhow::Result;
use clap::Parser;
use scour_core::config::EngineConfig;
use scour_core::fetch::{Fetcher, HttpFetcher};
use scour_core::manager::IndexManager;
use scour_core::updater::RealtimeUpdater;
use scour_server::{build_app, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Optional JSON config file; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Index directory path
    #[arg(long)]
    index: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(index_dir) = args.index {
        config.index_dir = index_dir;
    }

    let manager = Arc::new(IndexManager::new(&config.index_dir));
    if manager.has_saved_index() {
        manager.load()?;
        tracing::info!(documents = manager.document_count(), "loaded saved index");
    }

    let updater = RealtimeUpdater::start(Arc::clone(&manager), config.queue_capacity);
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.crawl)?);
    let state = AppState {
        manager,
        updates: updater.sender(),
        fetcher,
        crawl_config: config.crawl.clone(),
    };

    let app = build_app(state);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
