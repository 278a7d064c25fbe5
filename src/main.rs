//! Entry point for the `memex` capture daemon + retrieval tool service.
//! Both run concurrently under one runtime; whichever exits first (the tool
//! service on graceful shutdown, the capture loop never on its own) ends the
//! process.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use memex_capture::{CapturePipeline, Embedder, NullEmbedder, NullScreenCapture, NullTextExtractor, PendingQueue};
use memex_core::config::MemexConfig;
use memex_index::{BackendConfig, IndexConfig, VectorIndex};
use memex_store::RecordStore;
use memex_tools::ToolService;

#[derive(Parser, Debug)]
#[command(name = "memex", about = "Personal screen memory: capture daemon + retrieval tool service")]
struct Cli {
    /// Path to a MemexConfig YAML file. Falls back to built-in defaults
    /// (overlaid with `MEMEX__`-prefixed environment variables) if absent.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .json()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MemexConfig::from_file(path)?,
        None => MemexConfig::default(),
    };

    init_tracing(&config.log_level);
    tracing::info!(
        capture_interval_seconds = config.capture_interval_seconds,
        record_dir = %config.record_dir.display(),
        index_endpoint = %config.index_endpoint.display(),
        tool_service_endpoint = %config.tool_service_endpoint,
        "starting memex"
    );

    std::fs::create_dir_all(&config.record_dir)?;
    if let Some(parent) = config.index_endpoint.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = Arc::new(RecordStore::open(config.record_dir.clone())?);
    let index = Arc::new(VectorIndex::open(
        IndexConfig::new(config.embedding_dim).with_backend(BackendConfig::redb(config.index_endpoint.clone())),
    )?);
    let pending = PendingQueue::open(&config.record_dir)?;
    let embedder: Arc<dyn Embedder> = Arc::new(NullEmbedder::new(config.embedding_dim));

    // The screenshot library, OCR engine, and embedding model are
    // externally-supplied capabilities this workspace does not implement;
    // the null implementations keep the daemon safe to run on a headless
    // box until real ones are wired in behind the same traits.
    let pipeline = Arc::new(CapturePipeline::new(
        Arc::new(NullScreenCapture),
        Arc::new(NullTextExtractor),
        embedder.clone(),
        store.clone(),
        index.clone(),
        pending,
    ));

    let tools = ToolService::new(store, Some(index), embedder);
    let capture_interval = Duration::from_secs(config.capture_interval_seconds);

    let capture_task = tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.run_forever(capture_interval).await }
    });

    tokio::select! {
        result = memex_server::start(tools, &config.tool_service_endpoint) => {
            result?;
        }
        _ = capture_task => {
            tracing::warn!("capture loop ended unexpectedly");
        }
    }

    Ok(())
}
