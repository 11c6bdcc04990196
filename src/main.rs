use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use docscout::config::{Config, DEFAULT_CONFIG_PATH};
use docscout::fetcher::HttpFetcher;
use docscout::mcp::server::{McpContext, McpServer};
use docscout::service::DocService;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Documentation search MCP server over llms.txt catalogs.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the JSON config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Catalog source URL (repeatable); replaces `catalog_sources` from the config
    #[arg(long = "source", value_name = "URL")]
    sources: Vec<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write the effective configuration to --config and exit
    #[arg(long)]
    write_config: bool,
}

fn init_tracing(default_level: &str) {
    // stdout carries the MCP protocol, logs go to stderr
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    info!("Starting docscout MCP Server...");

    // 1. Load config
    let mut config = Config::load(&args.config)?;
    if !args.sources.is_empty() {
        config.catalog_sources = args.sources;
    }
    config.validate().context("invalid configuration")?;

    if args.write_config {
        config.save(&args.config)?;
        info!("Wrote configuration to {}", args.config);
        return Ok(());
    }
    let config = Arc::new(config);

    // 2. Init fetcher and service
    let fetcher = HttpFetcher::new(&config).context("failed to build HTTP client")?;
    let service = Arc::new(
        DocService::new(config.clone(), Arc::new(fetcher)).context("invalid allowed_hosts")?,
    );

    // 3. Warm the catalog; a failure here is retried on first use
    match service.ensure_ready().await {
        Ok(library) => info!("Catalog loaded: {} documents", library.catalog.len()),
        Err(e) => warn!("Catalog not loaded yet, will retry on first request: {e}"),
    }

    // 4. Start Server
    let server = McpServer::new(McpContext { service, config });
    server.start().await?;

    Ok(())
}
