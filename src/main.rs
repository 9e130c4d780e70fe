// sitecapture HTTP server
//
// Captures archives, image mockups and live pages into per-project storage and
// serves them back with every reference rewritten to the API.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use sitecapture::config::{IngestConfig, MirrorConfig, ServerConfig};
use sitecapture::utils::{
    DEFAULT_ASSET_TIMEOUT_MS, DEFAULT_BIND_ADDR, DEFAULT_MAX_ASSET_COUNT, DEFAULT_TOTAL_BUDGET_MS,
    DEFAULT_UPLOAD_BATCH_SIZE,
};

#[derive(Parser)]
#[command(
    name = "sitecapture",
    about = "Capture web content into project storage and serve it with rewritten references",
    version
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Listen address (host:port).
        #[arg(long, env = "SITECAPTURE_BIND", default_value = DEFAULT_BIND_ADDR)]
        bind: String,

        /// Directory holding stored objects and project metadata.
        #[arg(long, env = "SITECAPTURE_STORAGE_DIR", default_value = "./sitecapture-data")]
        storage_dir: PathBuf,

        /// Public base URL used in rewritten page references.
        /// Defaults to http://{bind}.
        #[arg(long, env = "SITECAPTURE_API_BASE")]
        api_base: Option<String>,

        /// Maximum assets accepted per mirror run.
        #[arg(long, default_value_t = DEFAULT_MAX_ASSET_COUNT)]
        max_assets: usize,

        /// Wall-clock budget per mirror run, in milliseconds.
        #[arg(long, default_value_t = DEFAULT_TOTAL_BUDGET_MS)]
        total_budget_ms: u64,

        /// Per-asset fetch timeout, in milliseconds.
        #[arg(long, default_value_t = DEFAULT_ASSET_TIMEOUT_MS)]
        asset_timeout_ms: u64,

        /// Concurrent storage writes during archive ingestion.
        #[arg(long, default_value_t = DEFAULT_UPLOAD_BATCH_SIZE)]
        upload_batch_size: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve {
            bind,
            storage_dir,
            api_base,
            max_assets,
            total_budget_ms,
            asset_timeout_ms,
            upload_batch_size,
        } => {
            let mirror = MirrorConfig::builder()
                .max_asset_count(max_assets)
                .total_budget_ms(total_budget_ms)
                .asset_timeout_ms(asset_timeout_ms)
                .build()?;
            let ingest = IngestConfig::default().with_upload_batch_size(upload_batch_size);

            let config = ServerConfig::new(storage_dir)
                .with_bind_addr(bind)
                .with_api_base(api_base)
                .with_mirror(mirror)
                .with_ingest(ingest);

            sitecapture::server::run(config).await
        }
    }
}
