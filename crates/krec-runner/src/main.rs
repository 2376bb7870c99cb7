//! # krec-runner
//!
//! Main entry point for the market data recorder.
//!
//! Builds the configuration (optional JSON file, then CLI overrides), starts
//! one connection worker per (pair, channel) and then idles as a supervisor
//! until the process is killed or Ctrl+C is received.
//!
//! # Usage
//!
//! ```bash
//! krec-runner -p BTC/USD -p ETH/USD -c book -c trade -d 100 -o /data/kraken
//! krec-runner --config krec.json --log-level debug
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use krec_core::config::{CollectorConfig, load_config};
use krec_md::{RestPairResolver, SubscriptionManager};
use tracing::info;

/// Streaming market data recorder.
#[derive(Parser)]
#[command(name = "krec-runner", about = "Record streaming market data to per-subscription JSON-lines files")]
struct Cli {
    /// Configuration file path (JSON). CLI flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// REST API endpoint (used to resolve `--pairs all`).
    #[arg(short = 'a', long)]
    rest_url: Option<String>,

    /// Streaming WebSocket endpoint.
    #[arg(short = 'w', long)]
    ws_url: Option<String>,

    /// Pairs to record, or `all` [default: BTC/USD ETH/USD].
    #[arg(short, long)]
    pairs: Vec<String>,

    /// Channels: book, ohlc, spread, ticker, trade, or `all` [default: book].
    #[arg(short, long)]
    channels: Vec<String>,

    /// Order book depth [default: 1000].
    #[arg(short, long)]
    depth: Option<u32>,

    /// Existing, writable output folder [default: ../output].
    #[arg(short, long)]
    output_folder: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,
}

impl Cli {
    /// File (or default) config with every given flag applied on top.
    fn into_config(self) -> Result<CollectorConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => CollectorConfig::default(),
        };
        if let Some(url) = self.rest_url {
            config.rest_url = url;
        }
        if let Some(url) = self.ws_url {
            config.ws_url = url;
        }
        if !self.pairs.is_empty() {
            config.pairs = self.pairs;
        }
        if !self.channels.is_empty() {
            config.channels = self.channels;
        }
        if let Some(depth) = self.depth {
            config.depth = depth;
        }
        if let Some(folder) = self.output_folder {
            config.output_folder = folder;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    let _log_guard = krec_core::logging::init_logging(&cli.log_level, cli.log_dir.as_deref(), "krec-runner");
    info!("krec-runner starting, log_level={}", cli.log_level);

    // 2. Build and validate configuration
    let config = cli.into_config()?;
    config.validate()?;
    info!(
        "config loaded: ws={}, pairs={:?}, channels={:?}, depth={}, output={}",
        config.ws_url,
        config.pairs,
        config.channels,
        config.depth,
        config.output_folder.display(),
    );

    // 3. Start workers, then supervise until interrupted
    let resolver = RestPairResolver::new(config.rest_url.clone());
    let manager = SubscriptionManager::new(&config, Box::new(resolver));
    let mut registry = manager.start().await?;

    tokio::select! {
        _ = manager.supervise(&registry) => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("shutdown signal received");
        }
    }

    registry.abort_all();
    info!("all workers stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "krec-runner", "-p", "XBT/EUR", "-c", "book", "-c", "TRADE", "-d", "25", "-o", "/tmp",
        ]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.pairs, vec!["XBT/EUR"]);
        assert_eq!(config.channels, vec!["book", "TRADE"]);
        assert_eq!(config.depth, 25);
        assert_eq!(config.output_folder, PathBuf::from("/tmp"));
        assert_eq!(config.ws_url, "wss://ws.kraken.com");
    }

    #[test]
    fn no_flags_keep_defaults() {
        let config = Cli::parse_from(["krec-runner"]).into_config().unwrap();
        assert_eq!(config.pairs, vec!["BTC/USD", "ETH/USD"]);
        assert_eq!(config.channels, vec!["book"]);
        assert_eq!(config.depth, 1000);
    }
}
