//! # krec-md
//!
//! Market data recording for the streaming feed.
//!
//! ## Architecture
//!
//! [`manager::SubscriptionManager`] expands the configured pairs × channels
//! into subscriptions and spawns one [`worker::ConnectionWorker`] per
//! subscription. Each worker owns its connection and its
//! [`JsonlWriter`](krec_core::writer::JsonlWriter), reconnects on its own
//! after a fixed delay, and hands every inbound frame to the
//! [`classifier`].
//!
//! - [`classifier`]: control vs. data frame decode and routing
//! - [`worker`]: per-subscription connect / subscribe / stream / reconnect
//! - [`registry`]: handles of running workers
//! - [`manager`]: fan-out, staggered start, heartbeat supervision
//! - [`asset_pairs`]: `"all"` pair resolution over REST

pub mod asset_pairs;
pub mod classifier;
pub mod manager;
pub mod registry;
pub mod worker;

pub use asset_pairs::{PairResolver, RestPairResolver, StaticPairResolver};
pub use manager::SubscriptionManager;
pub use registry::{WorkerHandle, WorkerRegistry};
pub use worker::{ConnectionWorker, WorkerState};
