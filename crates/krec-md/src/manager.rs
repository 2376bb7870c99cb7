//! Subscription manager: fan out one connection worker per (pair, channel).
//!
//! # Architecture
//!
//! ```text
//! SubscriptionManager.start()
//!   ├── resolve pairs ("all" → PairResolver) × expand channels
//!   ├── per subscription: output path → JsonlWriter → ConnectionWorker task
//!   │     (stagger between starts; a failed setup is logged and skipped)
//!   └── WorkerRegistry
//! SubscriptionManager.supervise() ──► heartbeat log, forever
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use krec_core::config::CollectorConfig;
use krec_core::error::KrecError;
use krec_core::types::{Subscription, cross_product, expand_channels, is_wildcard};
use krec_core::writer::JsonlWriter;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::asset_pairs::PairResolver;
use crate::registry::{WorkerHandle, WorkerRegistry};
use crate::worker::{ConnectionWorker, WorkerState};

/// Starts and then passively supervises all connection workers.
pub struct SubscriptionManager {
    ws_url: String,
    pairs: Vec<String>,
    channels: Vec<String>,
    depth: u32,
    output_folder: PathBuf,
    reconnect_delay: Duration,
    subscribe_stagger: Duration,
    heartbeat_interval: Duration,
    resolver: Box<dyn PairResolver>,
}

impl SubscriptionManager {
    /// Build a manager from a validated config.
    ///
    /// `resolver` is only consulted when the pair list contains `"all"`.
    pub fn new(config: &CollectorConfig, resolver: Box<dyn PairResolver>) -> Self {
        Self {
            ws_url: config.ws_url.clone(),
            pairs: config.pairs.clone(),
            channels: config.channels.clone(),
            depth: config.depth,
            output_folder: config.output_folder.clone(),
            reconnect_delay: config.reconnect_delay(),
            subscribe_stagger: config.subscribe_stagger(),
            heartbeat_interval: config.heartbeat_interval(),
            resolver,
        }
    }

    /// The full set of subscriptions this manager will start.
    pub async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        let pairs = if is_wildcard(&self.pairs) {
            self.resolver.resolve_pairs().await?
        } else {
            self.pairs.iter().map(|p| p.trim().to_owned()).filter(|p| !p.is_empty()).collect()
        };
        let channels = expand_channels(&self.channels)?;
        Ok(cross_product(&pairs, &channels, self.depth))
    }

    /// Start one worker per subscription.
    ///
    /// Setup failures are per subscription: they are logged and the rest
    /// continue. Only pair resolution or channel parsing failures abort.
    pub async fn start(&self) -> Result<WorkerRegistry> {
        let subs = self.subscriptions().await?;
        info!("starting {} subscription(s) against {}", subs.len(), self.ws_url);

        let mut registry = WorkerRegistry::new();
        for sub in subs {
            // Upstream rejects bursts of handshakes with 429.
            if !registry.is_empty() && !self.subscribe_stagger.is_zero() {
                tokio::time::sleep(self.subscribe_stagger).await;
            }
            match self.start_one(sub.clone()).await {
                Ok(handle) => registry.register(handle),
                Err(e) => error!("Cannot save messages for {}, {} due to: {e}", sub.pair, sub.channel),
            }
        }

        info!("{} worker(s) running", registry.len());
        Ok(registry)
    }

    async fn start_one(&self, sub: Subscription) -> Result<WorkerHandle, KrecError> {
        let path = sub.output_path(&self.output_folder);
        let writer = JsonlWriter::open(&path).await?;
        info!("{} messages for {} will be written into {}", sub.channel, sub.pair, path.display());

        let (worker, state) = ConnectionWorker::new(sub.clone(), &self.ws_url, self.reconnect_delay, writer)?;
        info!("Starting writer for: {}, {}", sub.pair, sub.channel);

        let label = sub.to_string();
        let task = tokio::spawn(async move {
            if let Err(e) = worker.run().await {
                error!("[{label}] worker stopped: {e}");
            }
        });
        Ok(WorkerHandle::new(sub, path, state, task))
    }

    /// Idle forever, logging a liveness heartbeat.
    ///
    /// Workers handle their own reconnects; nothing here restarts them.
    pub async fn supervise(&self, registry: &WorkerRegistry) {
        let started = Instant::now();
        let mut interval = tokio::time::interval(self.heartbeat_interval);
        interval.tick().await; // skip the immediate first tick

        loop {
            interval.tick().await;
            debug!(
                "supervisor alive: {} worker(s), {} subscribed, uptime {}s",
                registry.len(),
                registry.count_in(WorkerState::Subscribed),
                started.elapsed().as_secs()
            );
        }
    }

    /// Start everything, then supervise. Never returns `Ok`.
    pub async fn run(&self) -> Result<()> {
        let registry = self.start().await?;
        self.supervise(&registry).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use krec_core::Channel;

    use super::*;
    use crate::asset_pairs::StaticPairResolver;

    fn config(pairs: &[&str], channels: &[&str]) -> CollectorConfig {
        CollectorConfig {
            pairs: pairs.iter().map(|s| s.to_string()).collect(),
            channels: channels.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn wildcard_pairs_use_the_resolver() {
        let resolver = StaticPairResolver(vec!["XBT/USD".into(), "ETH/EUR".into()]);
        let manager = SubscriptionManager::new(&config(&["BTC/USD", "all"], &["trade"]), Box::new(resolver));

        let subs = manager.subscriptions().await.unwrap();
        assert_eq!(subs, vec![
            Subscription::new("XBT/USD", Channel::Trade, 1000),
            Subscription::new("ETH/EUR", Channel::Trade, 1000),
        ]);
    }

    #[tokio::test]
    async fn explicit_pairs_skip_the_resolver() {
        let resolver = StaticPairResolver(vec!["NOT/USED".into()]);
        let manager = SubscriptionManager::new(&config(&["BTC/USD"], &["all"]), Box::new(resolver));

        let subs = manager.subscriptions().await.unwrap();
        assert_eq!(subs.len(), 5);
        assert!(subs.iter().all(|s| s.pair == "BTC/USD"));
        let channels: Vec<Channel> = subs.iter().map(|s| s.channel).collect();
        assert_eq!(channels, Channel::ALL.to_vec());
    }

    #[tokio::test]
    async fn unknown_channel_aborts_start() {
        let manager =
            SubscriptionManager::new(&config(&["BTC/USD"], &["candles"]), Box::new(StaticPairResolver(vec![])));
        assert!(manager.start().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn starts_are_staggered_after_the_first_worker() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = CollectorConfig {
            ws_url: "http://invalid".into(),
            output_folder: dir.path().to_path_buf(),
            subscribe_stagger_ms: 3000,
            ..config(&["BTC/USD", "ETH/USD", "XBT/EUR"], &["trade"])
        };
        let manager = SubscriptionManager::new(&cfg, Box::new(StaticPairResolver(vec![])));

        let started = tokio::time::Instant::now();
        let mut registry = manager.start().await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(6));
        assert_eq!(registry.len(), 3);
        registry.abort_all();
    }
}
