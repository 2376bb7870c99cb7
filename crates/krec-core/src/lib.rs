//! # krec-core
//!
//! Core crate for the krec market data recorder, providing:
//!
//! - **Types** (`types`): channels and subscriptions
//! - **Configuration** (`config`): JSON config deserialization and validation
//! - **Error types** (`error`): `KrecError` and `StorageError` via thiserror
//! - **Writer** (`writer`): flush-on-write JSON-lines append store
//! - **WebSocket** (`ws`): connect helper and stream alias
//! - **Logging** (`logging`): tracing-based structured logging

pub mod config;
pub mod error;
pub mod logging;
pub mod types;
pub mod writer;
pub mod ws;

// Re-export types at crate root for convenience.
pub use types::*;
