//! WebSocket connect helper shared by the connection workers.

pub mod client;

pub use client::{WsStream, connect, extract_host};
