//! Plain WebSocket connect for one feed connection.
//!
//! Reconnect policy lives with the caller; this module only opens the
//! (optionally TLS) stream and reports failures as [`KrecError::WebSocket`].

use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::KrecError;

/// An open client WebSocket stream.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Establish a WebSocket connection to `url` (`ws://` or `wss://`).
pub async fn connect(url: &str) -> Result<WsStream, KrecError> {
    let parsed = url::Url::parse(url).map_err(|e| KrecError::WebSocket(format!("invalid url {url}: {e}")))?;
    match parsed.scheme() {
        "ws" | "wss" => {}
        other => return Err(KrecError::WebSocket(format!("unsupported scheme '{other}' in {url}"))),
    }

    debug!("connecting to {}", extract_host(url));
    let (stream, response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| KrecError::WebSocket(e.to_string()))?;
    debug!("handshake complete, status {}", response.status());
    Ok(stream)
}

/// Extract the host from a URL string.
pub fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("").to_string())
        .unwrap_or_default()
}
