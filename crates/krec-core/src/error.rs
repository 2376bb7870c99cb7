//! Typed error definitions for the krec recorder.
//!
//! [`KrecError`] covers setup-time failures (config, connect, REST). Write
//! failures of the append store are reported separately as [`StorageError`]
//! because they end a subscription's worker instead of triggering a reconnect.

use std::path::PathBuf;

use thiserror::Error;

/// Domain-specific errors for the krec recorder.
#[derive(Debug, Error)]
pub enum KrecError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// WebSocket connection, handshake, or communication error.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// Feed message or request serialization error.
    #[error("parse error: {0}")]
    Parse(String),

    /// REST request or response error.
    #[error("rest error: {0}")]
    Rest(String),

    /// Output target could not be opened or written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures of the JSON-lines append store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying file operation failed.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Write attempted after [`close`](crate::writer::JsonlWriter::close).
    #[error("writer for {} is closed", .0.display())]
    Closed(PathBuf),
}
