//! Batch invocation of component D's catch-up/rebuild sync (SPEC_FULL §4.4,
//! §6.5). Exit codes: `0` success, `2` partial, `3` index unavailable, `4`
//! configuration error, `5` store unreadable.
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use memex_capture::{Embedder, NullEmbedder};
use memex_core::config::MemexConfig;
use memex_index::{BackendConfig, IndexConfig, VectorIndex};
use memex_store::RecordStore;
use memex_sync::{exit_code, Sync};

#[derive(Parser, Debug)]
#[command(name = "memex-sync-cli", about = "Reconcile the record store and vector index out of band")]
struct Cli {
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert records present in the store but missing from the index.
    CatchUp,
    /// Clear the index and reinsert every non-empty record.
    Rebuild {
        /// Required acknowledgement that rebuild discards the existing index.
        #[arg(long)]
        confirm: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match MemexConfig::from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("configuration error: {e}");
                return ExitCode::from(exit_code::CONFIG_ERROR as u8);
            }
        },
        None => MemexConfig::default(),
    };

    tracing_subscriber::fmt().with_env_filter(&config.log_level).with_target(false).init();

    let store = match RecordStore::open(config.record_dir.clone()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("store unreadable: {e}");
            return ExitCode::from(exit_code::STORE_UNREADABLE as u8);
        }
    };

    let index = match VectorIndex::open(
        IndexConfig::new(config.embedding_dim).with_backend(BackendConfig::redb(config.index_endpoint.clone())),
    ) {
        Ok(index) => Arc::new(index),
        Err(e) => {
            eprintln!("index unavailable: {e}");
            return ExitCode::from(exit_code::INDEX_UNAVAILABLE as u8);
        }
    };

    let embedder: Arc<dyn Embedder> = Arc::new(NullEmbedder::new(config.embedding_dim));
    let sync = Sync::new(store, index, embedder);

    let report = match cli.command {
        Command::CatchUp => sync.catch_up(),
        Command::Rebuild { confirm } => sync.rebuild(confirm),
    };

    match report {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
            if report.errors > 0 {
                ExitCode::from(exit_code::PARTIAL as u8)
            } else {
                ExitCode::from(exit_code::SUCCESS as u8)
            }
        }
        Err(e) => {
            eprintln!("sync failed: {e}");
            ExitCode::from(exit_code::INDEX_UNAVAILABLE as u8)
        }
    }
}
