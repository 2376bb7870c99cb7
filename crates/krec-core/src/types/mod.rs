//! Core data types: feed channels and per-(pair, channel) subscriptions.

pub mod channel;
pub mod subscription;

pub use channel::*;
pub use subscription::*;
