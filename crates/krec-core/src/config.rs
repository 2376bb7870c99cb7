//! Configuration for the recorder.
//!
//! Settings come from an optional JSON file; anything missing falls back to
//! the defaults below. The runner applies CLI overrides on top before calling
//! [`CollectorConfig::validate`].
//!
//! # Example config
//!
//! ```json
//! {
//!   "ws_url": "wss://ws.kraken.com",
//!   "pairs": ["BTC/USD", "ETH/USD"],
//!   "channels": ["book", "trade"],
//!   "depth": 1000,
//!   "output_folder": "/data/kraken"
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::KrecError;
use crate::types::{Channel, expand_channels};

pub const DEFAULT_REST_URL: &str = "https://api.kraken.com";
pub const DEFAULT_WS_URL: &str = "wss://ws.kraken.com";
pub const DEFAULT_DEPTH: u32 = 1000;
pub const DEFAULT_OUTPUT_FOLDER: &str = "../output";

/// Fixed wait between a transport failure and the next connect attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Gap between starting consecutive subscriptions (upstream rate limit).
pub const SUBSCRIBE_STAGGER: Duration = Duration::from_secs(3);
/// Supervisor liveness log interval.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Top-level recorder config, deserialized from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// REST base URL used to resolve the `"all"` pair wildcard.
    pub rest_url: String,
    /// Streaming endpoint, one connection per subscription.
    pub ws_url: String,
    /// Pairs to record (e.g. `["BTC/USD"]`), or `["all"]`.
    pub pairs: Vec<String>,
    /// Channel names, or `["all"]`.
    pub channels: Vec<String>,
    /// Order book depth for `book` subscriptions.
    pub depth: u32,
    /// Existing, writable folder that receives the `.jsonl` files.
    pub output_folder: PathBuf,

    pub reconnect_delay_ms: u64,
    pub subscribe_stagger_ms: u64,
    pub heartbeat_interval_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            rest_url: DEFAULT_REST_URL.into(),
            ws_url: DEFAULT_WS_URL.into(),
            pairs: vec!["BTC/USD".into(), "ETH/USD".into()],
            channels: vec!["book".into()],
            depth: DEFAULT_DEPTH,
            output_folder: PathBuf::from(DEFAULT_OUTPUT_FOLDER),
            reconnect_delay_ms: RECONNECT_DELAY.as_millis() as u64,
            subscribe_stagger_ms: SUBSCRIBE_STAGGER.as_millis() as u64,
            heartbeat_interval_ms: HEARTBEAT_INTERVAL.as_millis() as u64,
        }
    }
}

impl CollectorConfig {
    /// Concrete channels after wildcard expansion.
    pub fn effective_channels(&self) -> Result<Vec<Channel>, KrecError> {
        expand_channels(&self.channels)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn subscribe_stagger(&self) -> Duration {
        Duration::from_millis(self.subscribe_stagger_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Check the settings before any connection is opened.
    pub fn validate(&self) -> Result<(), KrecError> {
        if self.pairs.iter().all(|p| p.trim().is_empty()) {
            return Err(KrecError::Config("no pairs configured".into()));
        }
        if self.channels.is_empty() {
            return Err(KrecError::Config("no channels configured".into()));
        }
        self.effective_channels()?;
        if self.depth == 0 {
            return Err(KrecError::Config("depth must be positive".into()));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(KrecError::Config("heartbeat_interval_ms must be positive".into()));
        }
        check_output_folder(&self.output_folder)
    }
}

/// The output folder must already exist, be a directory, and be writable.
fn check_output_folder(path: &Path) -> Result<(), KrecError> {
    let meta = std::fs::metadata(path)
        .map_err(|e| KrecError::Config(format!("output folder {}: {e}", path.display())))?;
    if !meta.is_dir() {
        return Err(KrecError::Config(format!("output folder {} is not a directory", path.display())));
    }
    // Creating a file is the only reliable test; permission bits ignore ACLs and mounts.
    tempfile::Builder::new()
        .prefix(".krec-write-check")
        .tempfile_in(path)
        .map(drop)
        .map_err(|e| KrecError::Config(format!("output folder {} is not writable: {e}", path.display())))
}

/// Load and parse a JSON config file.
pub fn load_config(path: &Path) -> anyhow::Result<CollectorConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: CollectorConfig = serde_json::from_str(&content)?;
    Ok(config)
}
